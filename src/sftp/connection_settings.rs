use std::path::{Path, PathBuf};

use crate::{exchange::exchange_error::ExchangeError, sftp::sftp_auth_key::SftpAuthKey};

/// User names and private key paths for the download and upload sessions.
///
/// The settings file holds one value per line, in this order:
/// download user, download private key, upload user, upload private key.
/// A missing line leaves the field empty, the server will then reject the login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub download_user: String,
    pub download_key_path: PathBuf,
    pub upload_user: String,
    pub upload_key_path: PathBuf,
}

impl ConnectionSettings {
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ExchangeError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|source| ExchangeError::Settings {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("read connection settings from {}", path.display());
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut lines = content.lines();
        let mut next_line = || lines.next().unwrap_or_default().to_string();

        ConnectionSettings {
            download_user: next_line(),
            download_key_path: PathBuf::from(next_line()),
            upload_user: next_line(),
            upload_key_path: PathBuf::from(next_line()),
        }
    }

    pub fn download_identity(&self, passphrase: Option<&str>, password: Option<&str>) -> SftpAuthKey {
        SftpAuthKey {
            user: self.download_user.clone(),
            key_path: self.download_key_path.clone(),
            passphrase: passphrase.map(str::to_owned),
            password: password.map(str::to_owned),
        }
    }

    pub fn upload_identity(&self, passphrase: Option<&str>, password: Option<&str>) -> SftpAuthKey {
        SftpAuthKey {
            user: self.upload_user.clone(),
            key_path: self.upload_key_path.clone(),
            passphrase: passphrase.map(str::to_owned),
            password: password.map(str::to_owned),
        }
    }
}
