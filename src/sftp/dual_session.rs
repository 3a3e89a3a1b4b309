use crate::{exchange::exchange_error::ExchangeError, sftp::{connection_settings::ConnectionSettings, remote_channel::RemoteChannel, sftp_channel::SftpChannel, sftp_exchanger_config::SftpExchangerConfig}};

/// The download and upload connections of one exchanger.
pub struct DualSession<C> {
    pub download: C,
    pub upload: C,
}

impl<C: RemoteChannel> DualSession<C> {
    pub fn new(download: C, upload: C) -> Self {
        DualSession { download, upload }
    }

    pub fn is_connected(&self) -> bool {
        self.download.is_connected() && self.upload.is_connected()
    }

    pub async fn disconnect(&self) {
        self.download.disconnect().await;
        self.upload.disconnect().await;
    }
}

impl DualSession<SftpChannel> {
    /// Opens the download session, then the upload session. If the upload session fails the
    /// download session is disconnected again, so either both exist or neither does.
    pub async fn open(config: &SftpExchangerConfig, settings: &ConnectionSettings) -> Result<Self, ExchangeError> {
        let download_auth = settings.download_identity(config.download_passphrase(), config.password());
        let download = SftpChannel::connect(config.host(), config.port(), &download_auth, config.accept_any_host_key())
        .await
        .map_err(ExchangeError::connection)?;

        let upload_auth = settings.upload_identity(config.upload_passphrase(), config.password());
        let upload = match SftpChannel::connect(config.host(), config.port(), &upload_auth, config.accept_any_host_key()).await {
            Ok(upload) => upload,
            Err(err) => {
                download.disconnect().await;
                return Err(ExchangeError::connection(err));
            }
        };

        Ok(DualSession { download, upload })
    }
}
