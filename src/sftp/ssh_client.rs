pub struct SshClient {
    host: String,
    port: u16,
    accept_any_host_key: bool,
}

impl SshClient {
    pub fn new(host: &str, port: u16, accept_any_host_key: bool) -> Self {
        SshClient {
            host: host.to_string(),
            port,
            accept_any_host_key,
        }
    }
}

impl russh::client::Handler for SshClient {
    type Error = anyhow::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, anyhow::Error> {
        if self.accept_any_host_key {
            tracing::debug!("host key check disabled for {}:{}", self.host, self.port);
            return Ok(true);
        }

        let known = russh::keys::check_known_hosts(&self.host, self.port, server_public_key)?;
        if !known {
            tracing::warn!("host key of {}:{} is not in known_hosts", self.host, self.port);
        }
        Ok(known)
    }
}
