use std::{path::Path, sync::{Arc, Mutex, atomic::{AtomicBool, Ordering}}};

use anyhow::anyhow;

use crate::sftp::remote_channel::{RemoteChannel, RemoteEntry};

/// A fake remote file system shared by any number of [`MemoryChannel`]s.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    files: Vec<MemoryFile>,
    clock: u32,
    fail_list: bool,
    fail_download: bool,
    fail_upload: bool,
    fail_remove: bool,
    fail_rename: Option<String>,
}

struct MemoryFile {
    path: String,
    content: Vec<u8>,
    mtime: u32,
}

impl MemoryRemote {
    pub fn new() -> Self {
        MemoryRemote::default()
    }

    pub fn put(&self, path: &str, content: &str, mtime: u32) {
        let mut state = self.state.lock().unwrap();
        state.files.retain(|file| file.path != path);
        state.files.push(MemoryFile {
            path: path.to_string(),
            content: content.as_bytes().to_vec(),
            mtime,
        });
    }

    pub fn content(&self, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.files.iter()
        .find(|file| file.path == path)
        .map(|file| String::from_utf8_lossy(&file.content).to_string())
    }

    /// Paths of all files directly inside `dir`, in listing order.
    pub fn paths_in(&self, dir: &str) -> Vec<String> {
        let prefix = format!("{}/", dir);
        let state = self.state.lock().unwrap();
        state.files.iter()
        .filter(|file| file.path.starts_with(&prefix))
        .map(|file| file.path.clone())
        .collect()
    }

    /// Moves a file from `upload` to `download`, the way the partner picks up and answers.
    pub fn deliver(&self, upload_path: &str, download_name: &str) {
        let mut state = self.state.lock().unwrap();
        state.clock += 1;
        let mtime = state.clock;
        if let Some(file) = state.files.iter_mut().find(|file| file.path == upload_path) {
            file.path = format!("download/{}", download_name);
            file.mtime = mtime;
        }
    }

    pub fn fail_list(&self, fail: bool) {
        self.state.lock().unwrap().fail_list = fail;
    }

    pub fn fail_download(&self, fail: bool) {
        self.state.lock().unwrap().fail_download = fail;
    }

    pub fn fail_upload(&self, fail: bool) {
        self.state.lock().unwrap().fail_upload = fail;
    }

    pub fn fail_remove(&self, fail: bool) {
        self.state.lock().unwrap().fail_remove = fail;
    }

    /// Makes renames of this path fail, as if another consumer claimed it first.
    pub fn fail_rename_of(&self, path: &str) {
        self.state.lock().unwrap().fail_rename = Some(path.to_string());
    }
}

pub struct MemoryChannel {
    remote: MemoryRemote,
    connected: Arc<AtomicBool>,
    disconnects: Arc<Mutex<usize>>,
}

impl MemoryChannel {
    pub fn new(remote: &MemoryRemote) -> Self {
        MemoryChannel {
            remote: remote.clone(),
            connected: Arc::new(AtomicBool::new(true)),
            disconnects: Arc::new(Mutex::new(0)),
        }
    }

    /// A handle that keeps observing this channel after it has been moved into an exchanger.
    pub fn probe(&self) -> ChannelProbe {
        ChannelProbe {
            connected: self.connected.clone(),
            disconnects: self.disconnects.clone(),
        }
    }
}

pub struct ChannelProbe {
    connected: Arc<AtomicBool>,
    disconnects: Arc<Mutex<usize>>,
}

impl ChannelProbe {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        *self.disconnects.lock().unwrap()
    }
}

impl RemoteChannel for MemoryChannel {
    async fn list(&self, dir: &str) -> anyhow::Result<Vec<RemoteEntry>> {
        let prefix = format!("{}/", dir);
        let state = self.remote.state.lock().unwrap();
        if state.fail_list {
            return Err(anyhow!("listing of '{}' failed", dir));
        }

        let mut entries = vec![
            RemoteEntry { name: ".".to_string(), mtime: Some(0) },
            RemoteEntry { name: "..".to_string(), mtime: Some(0) },
        ];
        entries.extend(state.files.iter()
        .filter_map(|file| file.path.strip_prefix(&prefix).map(|name| (name, file.mtime)))
        .map(|(name, mtime)| RemoteEntry { name: name.to_string(), mtime: Some(mtime) }));
        Ok(entries)
    }

    async fn download(&self, remote_path: &str, local_path: &Path) -> anyhow::Result<()> {
        let content = {
            let state = self.remote.state.lock().unwrap();
            if state.fail_download {
                return Err(anyhow!("download of '{}' failed", remote_path));
            }
            state.files.iter()
            .find(|file| file.path == remote_path)
            .map(|file| file.content.clone())
            .ok_or_else(|| anyhow!("no such file '{}'", remote_path))?
        };

        tokio::fs::write(local_path, content).await?;
        Ok(())
    }

    async fn upload(&self, local_path: &Path, remote_path: &str) -> anyhow::Result<()> {
        let content = tokio::fs::read(local_path).await?;
        let mut state = self.remote.state.lock().unwrap();
        if state.fail_upload {
            return Err(anyhow!("upload of '{}' failed", remote_path));
        }

        state.clock += 1;
        let mtime = state.clock;
        state.files.retain(|file| file.path != remote_path);
        state.files.push(MemoryFile {
            path: remote_path.to_string(),
            content,
            mtime,
        });
        Ok(())
    }

    async fn remove(&self, remote_path: &str) -> anyhow::Result<()> {
        let mut state = self.remote.state.lock().unwrap();
        if state.fail_remove {
            return Err(anyhow!("removal of '{}' failed", remote_path));
        }

        let before = state.files.len();
        state.files.retain(|file| file.path != remote_path);
        if state.files.len() == before {
            return Err(anyhow!("no such file '{}'", remote_path));
        }
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> anyhow::Result<()> {
        let mut state = self.remote.state.lock().unwrap();
        if state.fail_rename.as_deref() == Some(from) {
            return Err(anyhow!("no such file '{}'", from));
        }

        match state.files.iter_mut().find(|file| file.path == from) {
            Some(file) => {
                file.path = to.to_string();
                Ok(())
            }
            None => Err(anyhow!("no such file '{}'", from)),
        }
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        *self.disconnects.lock().unwrap() += 1;
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
