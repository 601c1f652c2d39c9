//! Domain types and models

pub mod auth;
pub mod upload;

pub use auth::{AuthEvent, AuthUser, TokenResponse};
pub use upload::{
    FileReferenceResponse, InitMultipartResponse, PartStatus, PartUploadResponse, UploadPhase,
    UploadProgress, UploadedFile,
};
