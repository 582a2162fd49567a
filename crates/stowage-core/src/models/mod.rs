//! Data models for the application

mod file;

pub use file::File;
