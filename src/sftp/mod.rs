pub mod claim_mode;
pub mod connection_settings;
pub mod dual_session;
pub mod remote_channel;
pub mod sftp_auth_key;
pub mod sftp_channel;
pub mod sftp_exchanger_config;
pub mod sftp_message_exchanger;
pub mod ssh_client;
mod staging;

#[cfg(test)]
mod memory_channel;
