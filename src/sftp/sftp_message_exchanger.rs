use std::{path::{Path, PathBuf}, time::{Duration, SystemTime, UNIX_EPOCH}};

use uuid::Uuid;

use crate::{
    exchange::{exchange_error::ExchangeError, message_exchanger::MessageExchanger},
    sftp::{
        claim_mode::ClaimMode,
        connection_settings::ConnectionSettings,
        dual_session::DualSession,
        remote_channel::{RemoteChannel, RemoteEntry},
        sftp_channel::SftpChannel,
        sftp_exchanger_config::SftpExchangerConfig,
        staging,
    },
};

pub const DOWNLOAD_DIR: &str = "download";
pub const UPLOAD_DIR: &str = "upload";
pub const CLAIM_PREFIX: &str = ".claimed-";
pub const DEFAULT_CLAIM_LEASE: Duration = Duration::from_secs(600);

/// Exchanges messages through the `upload` and `download` directories of a sftp server.
///
/// Every sent message becomes one new file in `upload`. The next received message is always
/// the file in `download` with the oldest modification time, and it is deleted once read.
/// Nothing stops two exchangers polling the same `download` directory from receiving the same
/// file unless [`ClaimMode::Rename`] is used.
///
/// With [`ClaimMode::Rename`] a claimed file is named `.claimed-<unix seconds>-<uuid>`. Claims
/// older than the claim lease are treated as abandoned and can be claimed again.
pub struct SftpMessageExchanger<C: RemoteChannel = SftpChannel> {
    session: Option<DualSession<C>>,
    staging_dir: PathBuf,
    claim_mode: ClaimMode,
    claim_lease: Duration,
}

impl SftpMessageExchanger<SftpChannel> {
    /// Reads the settings file and opens the download and upload sessions.
    ///
    /// Fails with [`ExchangeError::Settings`] if the settings file cannot be read and with
    /// [`ExchangeError::Connection`] if either session cannot be established.
    pub async fn connect(config: SftpExchangerConfig) -> Result<Self, ExchangeError> {
        let settings = ConnectionSettings::from_file(config.settings_file()).await?;
        let session = DualSession::open(&config, &settings).await?;

        tracing::info!("connected to {}:{}", config.host(), config.port());
        Ok(Self::new(session)
        .staging_dir(config.staging_dir())
        .claim_mode(config.claim_mode())
        .claim_lease(config.claim_lease()))
    }
}

impl<C: RemoteChannel> SftpMessageExchanger<C> {
    pub fn new(session: DualSession<C>) -> Self {
        SftpMessageExchanger {
            session: Some(session),
            staging_dir: PathBuf::from("."),
            claim_mode: ClaimMode::None,
            claim_lease: DEFAULT_CLAIM_LEASE,
        }
    }

    /// Sets the local directory for the transient staging files.
    pub fn staging_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.staging_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn claim_mode(mut self, claim_mode: ClaimMode) -> Self {
        self.claim_mode = claim_mode;
        self
    }

    /// How long a claim made with [`ClaimMode::Rename`] hides its file from other consumers.
    pub fn claim_lease(mut self, lease: Duration) -> Self {
        self.claim_lease = lease;
        self
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// Whether both the download and the upload session are still up.
    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(DualSession::is_connected)
    }

    /// Sends the message as `upload/<destination_name>`.
    pub async fn send_as(&mut self, message: &str, destination_name: &str) -> Result<(), ExchangeError> {
        let session = self.session.as_ref().ok_or(ExchangeError::Closed)?;
        let local_path = staging::write_message(&self.staging_dir, message).await.map_err(ExchangeError::forwarding)?;
        let remote_path = format!("{}/{}", UPLOAD_DIR, destination_name);

        let result = session.upload.upload(&local_path, &remote_path).await;
        staging::discard(&local_path).await;
        result.map_err(ExchangeError::forwarding)?;

        tracing::debug!("sent message as {}", remote_path);
        Ok(())
    }

    async fn fetch(channel: &C, remote_path: &str, staging_dir: &Path) -> anyhow::Result<String> {
        let local_path = staging::staging_path(staging_dir, "download");
        let result = Self::fetch_into(channel, remote_path, &local_path).await;
        staging::discard(&local_path).await;
        result
    }

    async fn fetch_into(channel: &C, remote_path: &str, local_path: &Path) -> anyhow::Result<String> {
        channel.download(remote_path, local_path).await?;
        let message = staging::read_message(local_path).await?;
        channel.remove(remote_path).await?;
        Ok(message)
    }

    async fn claim(channel: &C, remote_path: &str) -> Option<String> {
        let claimed_path = format!("{}/{}{}-{}", DOWNLOAD_DIR, CLAIM_PREFIX, unix_now(), Uuid::new_v4());
        match channel.rename(remote_path, &claimed_path).await {
            Ok(()) => Some(claimed_path),
            Err(err) => {
                tracing::debug!("could not claim {}, assuming another consumer took it: {:?}", remote_path, err);
                None
            }
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|now| now.as_secs()).unwrap_or(0)
}

/// Whether a claimed file has outlived its lease. A claim name without a readable timestamp
/// counts as stale, so its message is never hidden for good.
fn claim_expired(name: &str, lease: Duration, now: u64) -> bool {
    let claimed_at = name.strip_prefix(CLAIM_PREFIX)
    .and_then(|rest| rest.split('-').next())
    .and_then(|secs| secs.parse::<u64>().ok());

    match claimed_at {
        Some(claimed_at) => now.saturating_sub(claimed_at) >= lease.as_secs(),
        None => true,
    }
}

/// Candidates in receive order: oldest modification time first, listing order among equal times.
///
/// Live claims of other consumers are skipped in [`ClaimMode::Rename`] only.
fn oldest_first(entries: Vec<RemoteEntry>, claim_mode: ClaimMode, claim_lease: Duration) -> Vec<RemoteEntry> {
    let now = unix_now();
    let mut candidates: Vec<RemoteEntry> = entries.into_iter()
    .filter(|entry| entry.name != "." && entry.name != "..")
    .filter(|entry| match claim_mode {
        ClaimMode::None => true,
        ClaimMode::Rename => !entry.name.starts_with(CLAIM_PREFIX) || claim_expired(&entry.name, claim_lease, now),
    })
    .collect();

    candidates.sort_by_key(|entry| entry.mtime.unwrap_or(0));
    candidates
}

impl<C: RemoteChannel> MessageExchanger for SftpMessageExchanger<C> {
    async fn send(&mut self, message: &str) -> Result<(), ExchangeError> {
        let destination_name = format!("message-{}", Uuid::new_v4());
        self.send_as(message, &destination_name).await
    }

    async fn receive_now(&mut self) -> Result<Option<String>, ExchangeError> {
        let session = self.session.as_ref().ok_or(ExchangeError::Closed)?;
        let entries = session.download.list(DOWNLOAD_DIR).await.map_err(ExchangeError::reception)?;

        for entry in oldest_first(entries, self.claim_mode, self.claim_lease) {
            let original_path = format!("{}/{}", DOWNLOAD_DIR, entry.name);
            let remote_path = match self.claim_mode {
                ClaimMode::None => original_path.clone(),
                ClaimMode::Rename => match Self::claim(&session.download, &original_path).await {
                    Some(claimed_path) => claimed_path,
                    None => continue,
                },
            };

            tracing::debug!("receiving {} (mtime {:?})", original_path, entry.mtime);
            return match Self::fetch(&session.download, &remote_path, &self.staging_dir).await {
                Ok(message) => Ok(Some(message)),
                Err(err) => {
                    if remote_path != original_path {
                        if let Err(release_err) = session.download.rename(&remote_path, &original_path).await {
                            tracing::warn!("failed to release claimed file {}: {:?}", remote_path, release_err);
                        }
                    }
                    Err(ExchangeError::reception(err))
                }
            };
        }

        Ok(None)
    }

    async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.disconnect().await;
            tracing::info!("exchanger closed");
        }
    }
}
