use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    time::SystemTime,
};

use serde_json::Value;

use crate::error::PersistError;

/// Writes validated pillar records to YAML files.
///
/// The store trusts its caller: records are not re-validated here.
#[derive(Debug, Clone, Default)]
pub struct PillarStore {
    backup: bool,
}

impl PillarStore {
    /// Store without backups.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy an existing target to `<stem>.bk-<secs>.<ext>` before replacing it.
    /// A backup left by an earlier save in the same second is never reused.
    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Render `record` exactly as [`save`](Self::save) would write it.
    ///
    /// The output is JSON, which every YAML reader accepts. All strings
    /// come out quoted, so values such as `yes`, `off`, `1_000` or
    /// `2024-01-01` reload as strings under YAML 1.1 resolvers too.
    pub fn render(record: &Value) -> Result<String, serde_json::Error> {
        let mut out = serde_json::to_string_pretty(record)?;
        out.push('\n');
        Ok(out)
    }

    /// Atomically replace `path` with the rendered form of `record`.
    ///
    /// The record goes to a temporary file in the target directory, is
    /// flushed and synced, then renamed over `path`. On any failure the
    /// temporary file is removed and a pre-existing `path` is untouched.
    /// An existing target keeps its permissions; a new one gets the
    /// umask-derived mode of a regular file.
    pub fn save(&self, path: impl AsRef<Path>, record: &Value) -> Result<(), PersistError> {
        self.save_with(path.as_ref(), record, |_| Ok(()))
    }

    /// Like `save`, running `before_commit` on the synced temporary file
    /// right before the rename. An error from it aborts the save.
    pub(crate) fn save_with(
        &self,
        path: &Path,
        record: &Value,
        before_commit: impl FnOnce(&Path) -> io::Result<()>,
    ) -> Result<(), PersistError> {
        let content = Self::render(record).map_err(|source| PersistError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;

        let dir = parent_dir(path);
        fs::create_dir_all(&dir).map_err(|e| PersistError::io(&dir, e))?;

        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let prefix = format!(".{file_name}.");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".tmp");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let mut tmp = builder
            .tempfile_in(&dir)
            .map_err(|e| PersistError::io(&dir, e))?;
        debug!("writing pillar {} via {}", path.display(), tmp.path().display());

        let existing = fs::metadata(path).ok().filter(|m| m.is_file());
        if let Some(meta) = &existing {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(|e| PersistError::io(tmp.path(), e))?;
        }

        if let Err(e) = write_synced(&mut tmp, content.as_bytes()) {
            return Err(PersistError::io(tmp.path(), e));
        }

        let backup = match existing {
            Some(_) if self.backup => Some(backup_existing(path)?),
            _ => None,
        };

        let committed = match before_commit(tmp.path()) {
            Ok(()) => tmp
                .persist(path)
                .map(|_| ())
                .map_err(|e| PersistError::io(path, e.error)),
            Err(e) => Err(PersistError::io(tmp.path(), e)),
        };
        if let Err(e) = committed {
            if let Some(b) = &backup {
                discard_backup(b);
            }
            return Err(e);
        }
        if let Some(b) = &backup {
            info!("backed up {} to {}", path.display(), b.display());
        }

        sync_dir(&dir);
        Ok(())
    }

    /// Read a pillar file back into a record.
    pub fn load(path: impl AsRef<Path>) -> Result<Value, PersistError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| PersistError::io(path, e))?;
        serde_yaml::from_str(&content).map_err(|source| PersistError::Deserialize {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn write_synced(tmp: &mut tempfile::NamedTempFile, bytes: &[u8]) -> io::Result<()> {
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Copy `path` to the first free `<stem>.bk-<secs>[-<n>].<ext>`.
fn backup_existing(path: &Path) -> Result<PathBuf, PersistError> {
    let secs = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_err(|e| PersistError::io(path, io::Error::other(e)))?
        .as_secs();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("sls");

    let mut n = 0u32;
    let backup = loop {
        let tag = if n == 0 {
            format!("bk-{secs}.{ext}")
        } else {
            format!("bk-{secs}-{n}.{ext}")
        };
        let candidate = path.with_extension(tag);
        if !candidate.exists() {
            break candidate;
        }
        n += 1;
    };
    fs::copy(path, &backup).map_err(|e| PersistError::io(&backup, e))?;
    Ok(backup)
}

fn discard_backup(backup: &Path) {
    if let Err(e) = fs::remove_file(backup) {
        warn!("failed to remove backup {}: {e}", backup.display());
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        warn!("failed to sync directory {}: {e}", dir.display());
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
