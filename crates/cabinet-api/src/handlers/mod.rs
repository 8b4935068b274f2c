pub mod file_data;
pub mod files;
pub mod status;
pub mod upload;
pub mod users;
