use std::path::Path;

/// A file in a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    /// Modification time in seconds since the epoch, if the server reported one.
    pub mtime: Option<u32>,
}

/// The file operations the exchanger needs from one authenticated sftp channel.
///
/// Remote paths are relative to the session root, e.g. `download/file.txt`.
pub trait RemoteChannel: Send + Sync {
    /// Lists a remote directory. May include the `.` and `..` entries.
    fn list(&self, dir: &str) -> impl Future<Output = anyhow::Result<Vec<RemoteEntry>>> + Send;

    /// Copies a remote file into a new local file.
    fn download(&self, remote_path: &str, local_path: &Path) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Copies a local file to a new remote file, replacing any existing one.
    fn upload(&self, local_path: &Path, remote_path: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn remove(&self, remote_path: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn rename(&self, from: &str, to: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Exits the sftp channel and disconnects the session. Never fails, errors are only logged.
    fn disconnect(&self) -> impl Future<Output = ()> + Send;

    fn is_connected(&self) -> bool;
}
