pub mod delete;
pub mod init;
pub mod list;
pub mod snapshot;
pub mod volume;
