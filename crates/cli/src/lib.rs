//! # MGSDB Upload CLI
//!
//! Command-line front end for the MGSDB transport: sign in, upload files in
//! parts, inspect and end the session.
//!
//! ## Architecture
//! - Depends on `mgsdb-common`, `mgsdb-domain`, `mgsdb-core` and `mgsdb-infra`
//! - [`context::AppContext`] wires the hexagonal layers together
//! - [`commands`] holds one async function per subcommand

pub mod cli;
pub mod commands;
pub mod context;
pub mod error;
pub mod logging;

pub use cli::{Cli, Command, UploadArgs};
pub use commands::Report;
pub use context::AppContext;
pub use error::CliError;
