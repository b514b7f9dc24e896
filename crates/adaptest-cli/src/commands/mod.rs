pub mod init;
pub mod simulate;
pub mod validate;
