//! # Client
//!
//! The high-level facade over [`FtpSession`]: listings filtered by kind,
//! transfers with `(current, total)` progress reporting, recursive
//! make/remove directory and the existence probes.
//!
//! The facade serializes commands (one at a time on the control channel)
//! and sends a `NOOP` before the next command whenever the session has been
//! idle longer than the configured keepalive interval.

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::config::ConnectionConfig;
use crate::features::FeatureSet;
use crate::list::DirEntry;
use crate::session::FtpSession;
use crate::types::{FtpError, FtpResult};

/// Progress callback for transfers: `(current_bytes, total_bytes)`.
/// `total_bytes` is the server-reported SIZE for downloads and the local
/// file length for uploads; 0 when unknown.
pub type ProgressFn<'a> = &'a mut dyn FnMut(u64, u64);

/// High-level FTP client.
///
/// ```no_run
/// use ftpwire::{ConnectionConfig, FtpClient};
///
/// let mut client = FtpClient::with_config(ConnectionConfig::new("ftp.example.com"));
/// client.connect().unwrap();
/// client.create_dir("/backups/2024/march", true).unwrap();
/// client.disconnect().unwrap();
/// ```
pub struct FtpClient {
    config: ConnectionConfig,
    session: Option<FtpSession>,
    last_command: Instant,
}

impl FtpClient {
    /// Client with the default configuration (anonymous on `localhost:21`).
    pub fn new() -> Self {
        Self::with_config(ConnectionConfig::default())
    }

    pub fn with_config(config: ConnectionConfig) -> Self {
        Self {
            config,
            session: None,
            last_command: Instant::now(),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(FtpSession::is_open)
    }

    /// Connect and log in with the configured credentials.
    pub fn connect(&mut self) -> FtpResult<()> {
        if self.session.is_some() {
            return Err(FtpError::Argument("client is already connected".to_string()));
        }
        self.session = Some(FtpSession::connect(&self.config)?);
        self.last_command = Instant::now();
        Ok(())
    }

    /// Send QUIT and drop the session. Does nothing when already
    /// disconnected.
    pub fn disconnect(&mut self) -> FtpResult<()> {
        match self.session.take() {
            Some(mut session) => session.quit(),
            None => Ok(()),
        }
    }

    /// Greeting text the server sent on connect.
    pub fn welcome_msg(&self) -> Option<&str> {
        self.session.as_ref().and_then(FtpSession::welcome_msg)
    }

    /// Extensions the server advertised during login.
    pub fn get_features(&self) -> FtpResult<FeatureSet> {
        self.session
            .as_ref()
            .map(FtpSession::features)
            .ok_or_else(FtpError::not_connected)
    }

    // -- listings

    /// File entries of `path` (or the working directory).
    pub fn get_files(&mut self, path: Option<&str>) -> FtpResult<Vec<DirEntry>> {
        let entries = self.session_mut()?.list_dir(path)?;
        Ok(entries.into_iter().filter(DirEntry::is_file).collect())
    }

    /// Directory entries of `path` (or the working directory).
    pub fn get_directories(&mut self, path: Option<&str>) -> FtpResult<Vec<DirEntry>> {
        let entries = self.session_mut()?.list_dir(path)?;
        Ok(entries.into_iter().filter(DirEntry::is_dir).collect())
    }

    // -- navigation

    /// Working directory reported by the server.
    pub fn get_current_directory(&mut self) -> FtpResult<String> {
        self.session_mut()?.pwd()
    }

    /// Change the working directory; fails with `NotFound` when the server
    /// refuses the path.
    pub fn set_current_directory(&mut self, path: &str) -> FtpResult<()> {
        require_path(path)?;
        if self.session_mut()?.cwd(path)? {
            Ok(())
        } else {
            Err(FtpError::NotFound(path.to_string()))
        }
    }

    // -- directory management

    /// Create a directory. With `recursive`, missing ancestors of an
    /// absolute path are created one segment at a time: each prefix is
    /// probed with CWD and, when the probe fails, the segment is created
    /// relative to the deepest directory reached. The working directory is
    /// left at the deepest created path.
    pub fn create_dir(&mut self, path: &str, recursive: bool) -> FtpResult<()> {
        require_path(path)?;
        if !recursive {
            return self.session_mut()?.mkd(path);
        }

        self.session_mut()?.cwd("/")?;
        let mut prefix = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            prefix.push('/');
            prefix.push_str(segment);
            if self.session_mut()?.cwd(&prefix)? {
                continue;
            }
            self.session_mut()?.mkd(segment)?;
            if !self.session_mut()?.cwd(&prefix)? {
                return Err(FtpError::NotFound(prefix));
            }
        }
        Ok(())
    }

    /// Remove a directory. With `recursive`, the tree below it is deleted
    /// first (files with DELE, subdirectories by recursion) and the working
    /// directory is restored afterwards, whether or not the removal
    /// succeeded.
    pub fn delete_directory(&mut self, path: &str, recursive: bool) -> FtpResult<()> {
        require_path(path)?;
        if !recursive {
            return self.session_mut()?.rmd(path);
        }

        let saved = self.session_mut()?.pwd()?;
        let removed = self.remove_tree(path);
        // a failure mid-recursion leaves the working directory somewhere
        // inside the subtree; restore before reporting it
        let restored = self
            .session_mut()
            .and_then(|session| session.cwd(&saved))
            .map(|_| ());
        removed?;
        restored
    }

    fn remove_tree(&mut self, path: &str) -> FtpResult<()> {
        if !self.session_mut()?.cwd(path)? {
            return Err(FtpError::NotFound(path.to_string()));
        }
        let entries = self.session_mut()?.list_dir(None)?;
        for entry in entries.iter().filter(|e| e.is_file() || e.is_symlink()) {
            self.session_mut()?.dele(entry.name())?;
        }
        for entry in entries.iter().filter(|e| e.is_dir()) {
            self.remove_tree(entry.name())?;
        }
        self.session_mut()?.cdup()?;
        self.session_mut()?.rmd(path)
    }

    // -- file management

    /// Delete a single remote file.
    pub fn delete_file(&mut self, path: &str) -> FtpResult<()> {
        require_path(path)?;
        self.session_mut()?.dele(path)
    }

    /// Rename a remote file or directory.
    pub fn rename(&mut self, from: &str, to: &str) -> FtpResult<()> {
        if from.trim().is_empty() || to.trim().is_empty() {
            return Err(FtpError::Argument(
                "rename operands must not be empty".to_string(),
            ));
        }
        self.session_mut()?.rename(from, to)
    }

    // -- probes

    /// Whether a remote file exists, probed with SIZE. A `NotFound` answer
    /// becomes `false`; every other failure propagates.
    pub fn file_exists(&mut self, path: &str) -> FtpResult<bool> {
        require_path(path)?;
        match self.session_mut()?.size(path) {
            Ok(_) => Ok(true),
            Err(FtpError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether a remote directory exists, probed with CWD. The working
    /// directory is saved first and restored unconditionally. With no path,
    /// the probe re-enters the current directory.
    pub fn directory_exists(&mut self, path: Option<&str>) -> FtpResult<bool> {
        let saved = self.session_mut()?.pwd()?;
        let target = match path {
            Some(p) if !p.trim().is_empty() => p.to_string(),
            _ => saved.clone(),
        };
        let found = self.session_mut()?.cwd(&target)?;
        self.session_mut()?.cwd(&saved)?;
        Ok(found)
    }

    // -- transfers

    /// Upload the local file at `local`. The remote name defaults to the
    /// local file name. The local length is recorded before the transfer
    /// and reported as the progress total.
    pub fn upload(
        &mut self,
        local: &Path,
        target: Option<&str>,
        mut progress: Option<ProgressFn<'_>>,
    ) -> FtpResult<u64> {
        let meta = std::fs::metadata(local).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FtpError::NotFound(local.display().to_string()),
            _ => FtpError::Network(e),
        })?;
        if !meta.is_file() {
            return Err(FtpError::Argument(format!(
                "not a regular file: {}",
                local.display()
            )));
        }
        let total = meta.len();
        let remote = match target {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => local
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    FtpError::Argument(format!("no file name in {}", local.display()))
                })?,
        };
        self.session_mut()?.stor(&remote, local, |sent| {
            if let Some(on_progress) = progress.as_deref_mut() {
                on_progress(sent, total);
            }
        })
    }

    /// Download the remote file `src` into `dst`. Refuses to overwrite an
    /// existing destination unless `overwrite` is set. When a progress
    /// callback is installed and the server supports SIZE, the remote size
    /// is queried first and reported as the progress total.
    pub fn download(
        &mut self,
        src: &str,
        dst: &Path,
        overwrite: bool,
        mut progress: Option<ProgressFn<'_>>,
    ) -> FtpResult<u64> {
        require_path(src)?;
        if dst.exists() && !overwrite {
            return Err(FtpError::Exists(dst.to_path_buf()));
        }
        let total = if progress.is_some() && self.get_features()?.size {
            match self.session_mut()?.size(src) {
                Ok(size) => size,
                Err(FtpError::NotFound(_)) => 0,
                Err(e) => return Err(e),
            }
        } else {
            0
        };
        let mut current = 0u64;
        self.session_mut()?.retr(src, dst, |chunk| {
            current += chunk;
            if let Some(on_progress) = progress.as_deref_mut() {
                on_progress(current, total);
            }
        })
    }

    // -- metadata

    /// Remote file size in bytes.
    pub fn get_file_size(&mut self, path: &str) -> FtpResult<u64> {
        require_path(path)?;
        self.session_mut()?.size(path)
    }

    /// Remote last-modification time (UTC).
    pub fn get_last_modification_time(&mut self, path: &str) -> FtpResult<DateTime<Utc>> {
        require_path(path)?;
        self.session_mut()?.mdtm(path)
    }

    /// Set the remote last-modification time (UTC).
    pub fn set_modification_time(
        &mut self,
        path: &str,
        stamp: DateTime<Utc>,
    ) -> FtpResult<()> {
        require_path(path)?;
        self.session_mut()?.mfmt(path, stamp)
    }

    // -- internals

    /// Borrow the session, failing fast when disconnected, and ping the
    /// server first when the keepalive interval has elapsed.
    fn session_mut(&mut self) -> FtpResult<&mut FtpSession> {
        let Some(session) = self.session.as_mut() else {
            return Err(FtpError::not_connected());
        };
        if self.last_command.elapsed() >= self.config.keepalive {
            session.noop()?;
        }
        self.last_command = Instant::now();
        Ok(session)
    }
}

impl Default for FtpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn require_path(path: &str) -> FtpResult<()> {
    if path.trim().is_empty() {
        return Err(FtpError::Argument("path must not be empty".to_string()));
    }
    Ok(())
}
