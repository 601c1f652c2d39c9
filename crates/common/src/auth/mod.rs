//! Credential handling for the MGSDB client
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ CredentialStore  │  access/refresh pair, user profile, logout marker
//! └────────┬─────────┘
//!          │
//!          ├──► jwt             (unverified `exp` inspection)
//!          │
//!          └──► SessionStorage  (memory or JSON file persistence)
//! ```
//!
//! Refreshing and the login/logout flows live in the infra crate; this
//! module only owns the state.

pub mod credentials;
pub mod jwt;
pub mod storage;

pub use credentials::{
    CredentialStore, ACCESS_TOKEN_KEY, AUTH_USER_KEY, FORCE_RELOGIN_KEY, REFRESH_TOKEN_KEY,
};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage, StorageError};
