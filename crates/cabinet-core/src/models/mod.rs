//! Data models shared by every cabinet crate.

mod file;
mod job;
mod user;

pub use file::{
    FileKind, FileRecord, FileResponse, NewFileRecord, ParentIdInput, ParentRef, UploadRequest,
    Visibility,
};
pub use job::ThumbnailJob;
pub use user::{CreateUserRequest, User, UserResponse};
