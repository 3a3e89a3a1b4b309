use std::path::PathBuf;

/// The identity one session authenticates with.
#[derive(Debug, Clone)]
pub struct SftpAuthKey {
    pub user: String,
    pub key_path: PathBuf,
    pub passphrase: Option<String>,
    /// Tried only when the server rejects the key.
    pub password: Option<String>,
}
