use std::{path::Path, sync::Arc};

use anyhow::bail;
use russh::{Disconnect, client::{Handle, KeyboardInteractiveAuthResponse}, keys::{HashAlg, PrivateKeyWithHashAlg}};
use russh_sftp::client::SftpSession;
use tokio::io::AsyncWriteExt;

use crate::sftp::{remote_channel::{RemoteChannel, RemoteEntry}, sftp_auth_key::SftpAuthKey, ssh_client::SshClient};

/// One authenticated ssh session with its sftp channel.
pub struct SftpChannel {
    address: String,
    session: Handle<SshClient>,
    sftp: SftpSession,
}

const MAX_KEYBOARD_INTERACTIVE_ROUNDS: usize = 5;

/// One authentication attempt. Attempts are made in order until the server accepts one.
enum AuthStep {
    PublicKey(PrivateKeyWithHashAlg),
    KeyboardInteractive(String),
    Password(String),
}

impl AuthStep {
    fn name(&self) -> &'static str {
        match self {
            AuthStep::PublicKey(_) => "publickey",
            AuthStep::KeyboardInteractive(_) => "keyboard-interactive",
            AuthStep::Password(_) => "password",
        }
    }
}

/// Public key first, then keyboard-interactive answered with the password (or the key
/// passphrase when there is no password), then password. A key that cannot be loaded is
/// skipped, its error is returned so a rejected login can report it.
fn auth_plan(auth: &SftpAuthKey) -> (Vec<AuthStep>, Option<anyhow::Error>) {
    let mut steps = Vec::new();
    let mut key_error = None;

    match russh::keys::load_secret_key(&auth.key_path, auth.passphrase.as_deref()) {
        Ok(key) => {
            let hash_alg = match &key.algorithm() {
                russh::keys::Algorithm::Rsa { .. } => Some(HashAlg::Sha256),
                _ => None,
            };
            steps.push(AuthStep::PublicKey(PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg)));
        }
        Err(err) => {
            tracing::warn!("skipping publickey authentication, cannot load {}: {}", auth.key_path.display(), err);
            key_error = Some(anyhow::Error::from(err).context(format!("failed to load private key '{}'", auth.key_path.display())));
        }
    }

    if let Some(secret) = auth.password.as_ref().or(auth.passphrase.as_ref()) {
        steps.push(AuthStep::KeyboardInteractive(secret.clone()));
    }
    if let Some(password) = &auth.password {
        steps.push(AuthStep::Password(password.clone()));
    }

    (steps, key_error)
}

impl SftpChannel {
    /// Connects, authenticates and opens the sftp subsystem.
    pub async fn connect(host: &str, port: u16, auth: &SftpAuthKey, accept_any_host_key: bool) -> anyhow::Result<Self> {
        let config = russh::client::Config::default();
        let ssh = SshClient::new(host, port, accept_any_host_key);

        tracing::debug!("connecting to {}:{} as {}", host, port, auth.user);
        let mut session = russh::client::connect(Arc::new(config), (host, port), ssh).await?;

        let (steps, key_error) = auth_plan(auth);
        if !Self::authenticate(&mut session, &auth.user, steps).await? {
            let rejected = format!("authentication rejected for user '{}' on {}:{}", auth.user, host, port);
            match key_error {
                Some(key_error) => return Err(key_error.context(rejected)),
                None => bail!(rejected),
            }
        }

        let channel = session.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream()).await?;

        tracing::debug!("connected to {}:{}", host, port);
        Ok(SftpChannel {
            address: format!("{}:{}", host, port),
            session,
            sftp,
        })
    }

    async fn authenticate(session: &mut Handle<SshClient>, user: &str, steps: Vec<AuthStep>) -> anyhow::Result<bool> {
        for step in steps {
            let name = step.name();
            let accepted = match step {
                AuthStep::PublicKey(key) => session.authenticate_publickey(user, key).await?.success(),
                AuthStep::KeyboardInteractive(secret) => Self::keyboard_interactive(session, user, &secret).await?,
                AuthStep::Password(password) => session.authenticate_password(user, password).await?.success(),
            };

            if accepted {
                tracing::debug!("authenticated using {}", name);
                return Ok(true);
            }
            tracing::debug!("{} authentication rejected", name);
        }

        Ok(false)
    }

    async fn keyboard_interactive(session: &mut Handle<SshClient>, user: &str, secret: &str) -> anyhow::Result<bool> {
        let mut response = session.authenticate_keyboard_interactive_start(user, None::<String>).await?;
        let mut rounds = 0;

        loop {
            match response {
                KeyboardInteractiveAuthResponse::Success => return Ok(true),
                KeyboardInteractiveAuthResponse::InfoRequest { prompts, .. } if rounds < MAX_KEYBOARD_INTERACTIVE_ROUNDS => {
                    rounds += 1;
                    let answers = prompts.iter().map(|_| secret.to_string()).collect();
                    response = session.authenticate_keyboard_interactive_respond(answers).await?;
                }
                _ => return Ok(false),
            }
        }
    }
}

impl RemoteChannel for SftpChannel {
    async fn list(&self, dir: &str) -> anyhow::Result<Vec<RemoteEntry>> {
        let entries = self.sftp.read_dir(dir).await?;
        Ok(entries.into_iter()
        .map(|entry| RemoteEntry {
            name: entry.file_name(),
            mtime: entry.metadata().mtime,
        })
        .collect())
    }

    async fn download(&self, remote_path: &str, local_path: &Path) -> anyhow::Result<()> {
        let mut remote_file = self.sftp.open(remote_path).await?;
        let mut local_file = tokio::fs::File::create(local_path).await?;
        let bytes = tokio::io::copy(&mut remote_file, &mut local_file).await?;
        local_file.flush().await?;
        remote_file.shutdown().await?;

        tracing::debug!("downloaded {} ({} bytes) from {}", remote_path, bytes, self.address);
        Ok(())
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> anyhow::Result<()> {
        let mut local_file = tokio::fs::File::open(local_path).await?;
        let mut remote_file = self.sftp.create(remote_path).await?;
        let bytes = tokio::io::copy(&mut local_file, &mut remote_file).await?;
        remote_file.shutdown().await?;

        tracing::debug!("uploaded {} ({} bytes) to {}", remote_path, bytes, self.address);
        Ok(())
    }

    async fn remove(&self, remote_path: &str) -> anyhow::Result<()> {
        self.sftp.remove_file(remote_path).await?;
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> anyhow::Result<()> {
        self.sftp.rename(from, to).await?;
        Ok(())
    }

    async fn disconnect(&self) {
        if let Err(err) = self.sftp.close().await {
            tracing::debug!("sftp channel to {} already closed: {:?}", self.address, err);
        }
        if let Err(err) = self.session.disconnect(Disconnect::ByApplication, "", "en").await {
            tracing::debug!("session to {} already closed: {:?}", self.address, err);
        }
        tracing::debug!("disconnected from {}", self.address);
    }

    fn is_connected(&self) -> bool {
        !self.session.is_closed()
    }
}
