pub mod exchange;

#[cfg(feature = "sftp")]
pub mod sftp;
