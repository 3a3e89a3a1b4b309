use std::path::{Path, PathBuf};

use uuid::Uuid;

pub fn staging_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{}-{}.tmp", prefix, Uuid::new_v4()))
}

/// Writes the message, UTF-8 encoded, to a new staging file and returns its path.
pub async fn write_message(dir: &Path, message: &str) -> std::io::Result<PathBuf> {
    let path = staging_path(dir, "upload");
    tokio::fs::write(&path, message.as_bytes()).await?;
    Ok(path)
}

pub async fn read_message(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(normalize(&String::from_utf8_lossy(&bytes)))
}

/// Collapses `\r\n` and `\r` into `\n` and drops one trailing `\n`.
pub fn normalize(content: &str) -> String {
    let mut message = content.replace("\r\n", "\n").replace('\r', "\n");
    if message.ends_with('\n') {
        message.pop();
    }
    message
}

/// Removes a staging file. A file that was never created is fine, other failures are logged.
pub async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {},
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {},
        Err(err) => tracing::warn!("failed to remove staging file {}: {}", path.display(), err),
    }
}
