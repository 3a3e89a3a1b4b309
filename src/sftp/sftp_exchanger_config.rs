use std::{path::{Path, PathBuf}, time::Duration};

use anyhow::bail;

use crate::sftp::{claim_mode::ClaimMode, sftp_message_exchanger::DEFAULT_CLAIM_LEASE};

pub const DEFAULT_HOST: &str = "sftp-eu.amazonsedi.com";
pub const DEFAULT_PORT: u16 = 2222;

#[derive(Debug, Clone)]
pub struct SftpExchangerConfig {
    host: String,
    port: u16,
    settings_file: PathBuf,
    download_passphrase: Option<String>,
    upload_passphrase: Option<String>,
    password: Option<String>,
    staging_dir: PathBuf,
    accept_any_host_key: bool,
    claim_mode: ClaimMode,
    claim_lease: Duration,
}

impl SftpExchangerConfig {
    pub fn builder() -> SftpExchangerConfigBuilder {
        SftpExchangerConfigBuilder {
            host: None,
            port: None,
            settings_file: None,
            download_passphrase: None,
            upload_passphrase: None,
            password: None,
            staging_dir: None,
            accept_any_host_key: false,
            claim_mode: ClaimMode::None,
            claim_lease: None,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn settings_file(&self) -> &Path {
        &self.settings_file
    }

    pub fn download_passphrase(&self) -> Option<&str> {
        self.download_passphrase.as_deref()
    }

    pub fn upload_passphrase(&self) -> Option<&str> {
        self.upload_passphrase.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn accept_any_host_key(&self) -> bool {
        self.accept_any_host_key
    }

    pub fn claim_mode(&self) -> ClaimMode {
        self.claim_mode
    }

    pub fn claim_lease(&self) -> Duration {
        self.claim_lease
    }
}

pub struct SftpExchangerConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    settings_file: Option<PathBuf>,
    download_passphrase: Option<String>,
    upload_passphrase: Option<String>,
    password: Option<String>,
    staging_dir: Option<PathBuf>,
    accept_any_host_key: bool,
    claim_mode: ClaimMode,
    claim_lease: Option<Duration>,
}

impl SftpExchangerConfigBuilder {
    pub fn build(self) -> anyhow::Result<SftpExchangerConfig> {
        let settings_file = match self.settings_file {
            Some(path) => path,
            None => bail!("a settings file is required"),
        };

        let default_port = self.port.unwrap_or(DEFAULT_PORT);
        let (host, port) = match &self.host {
            Some(host) => split_host(host, default_port)?,
            None => (DEFAULT_HOST.to_string(), default_port),
        };

        Ok(SftpExchangerConfig {
            host,
            port,
            settings_file,
            download_passphrase: self.download_passphrase,
            upload_passphrase: self.upload_passphrase,
            password: self.password,
            staging_dir: self.staging_dir.unwrap_or(PathBuf::from(".")),
            accept_any_host_key: self.accept_any_host_key,
            claim_mode: self.claim_mode,
            claim_lease: self.claim_lease.unwrap_or(DEFAULT_CLAIM_LEASE),
        })
    }

    /// **Required**
    ///
    /// Path of the four line settings file with the user names and private keys.
    pub fn settings_file(mut self, path: impl AsRef<Path>) -> Self {
        self.settings_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// **Optional**
    ///
    /// Accepts `host` or `host:port`. A port given here wins over `port()`.
    ///
    /// Default: `sftp-eu.amazonsedi.com`
    pub fn host(mut self, host: impl AsRef<str>) -> Self {
        self.host = Some(host.as_ref().to_owned());
        self
    }

    /// **Optional**
    ///
    /// Default: `2222`
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// **Optional**
    ///
    /// Passphrase of both private keys.
    pub fn passphrase(mut self, passphrase: impl AsRef<str>) -> Self {
        self.download_passphrase = Some(passphrase.as_ref().to_owned());
        self.upload_passphrase = Some(passphrase.as_ref().to_owned());
        self
    }

    /// **Optional**
    pub fn download_passphrase(mut self, passphrase: impl AsRef<str>) -> Self {
        self.download_passphrase = Some(passphrase.as_ref().to_owned());
        self
    }

    /// **Optional**
    pub fn upload_passphrase(mut self, passphrase: impl AsRef<str>) -> Self {
        self.upload_passphrase = Some(passphrase.as_ref().to_owned());
        self
    }

    /// **Optional**
    ///
    /// Password tried when the server rejects the private key.
    pub fn password(mut self, password: impl AsRef<str>) -> Self {
        self.password = Some(password.as_ref().to_owned());
        self
    }

    /// **Optional**
    ///
    /// Local directory for the transient upload and download files.
    ///
    /// Default: the working directory
    pub fn staging_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.staging_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// **Optional**
    ///
    /// Skips the known_hosts check of the server key.
    ///
    /// Default: `false`
    pub fn accept_any_host_key(mut self, accept: bool) -> Self {
        self.accept_any_host_key = accept;
        self
    }

    /// **Optional**
    ///
    /// Default: `ClaimMode::None`
    pub fn claim_mode(mut self, claim_mode: ClaimMode) -> Self {
        self.claim_mode = claim_mode;
        self
    }

    /// **Optional**
    ///
    /// Age after which another consumer's claim counts as abandoned and its file is received
    /// again. Only used with `ClaimMode::Rename`.
    ///
    /// Default: 10 minutes
    pub fn claim_lease(mut self, lease: Duration) -> Self {
        self.claim_lease = Some(lease);
        self
    }
}

/// Splits `host`, `host:port`, `[v6]:port` or a bare IPv6 literal such as `::1`.
fn split_host(host: &str, default_port: u16) -> anyhow::Result<(String, u16)> {
    if let Some(rest) = host.strip_prefix('[') {
        let Some((address, port)) = rest.split_once(']') else {
            bail!("missing ']' in host '{}'", host);
        };
        let port = match port.strip_prefix(':') {
            Some(port) => port.parse::<u16>()?,
            None if port.is_empty() => default_port,
            None => bail!("unexpected '{}' after ']' in host '{}'", port, host),
        };
        return Ok((address.to_string(), port));
    }

    match host.split_once(':') {
        Some((name, port)) if !port.contains(':') => Ok((name.to_string(), port.parse::<u16>()?)),
        _ => Ok((host.to_string(), default_port)),
    }
}
