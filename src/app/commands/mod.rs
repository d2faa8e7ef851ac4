pub mod dispatch;
pub mod init;
pub mod plan;
pub mod summary;
pub mod trigger;
pub mod validate;
