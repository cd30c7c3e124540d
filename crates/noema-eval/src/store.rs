//! # Run Store
//!
//! Crash-safe directory-per-run persistence. Every file lands via a
//! temporary sibling and an atomic rename with mode 0644; the run index at
//! `<runs_dir>/index.json` keeps headers newest-first with a bounded
//! length, and pruning removes the oldest `run_*` directories beyond the
//! retention cap. A corrupted index is archived aside and rebuilt rather
//! than failing the request.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use noema_core::NoemaError;

static RUN_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Generate a run id: `run_<ms>_<nonce>` with a cryptographic nonce,
/// falling back to `(pid, counter)` if the RNG fails.
pub fn generate_run_id() -> String {
    let ms = unix_millis();
    let mut buf = [0u8; 8];
    match rand::rngs::OsRng.try_fill_bytes(&mut buf) {
        Ok(()) => {
            let nonce = u64::from_be_bytes(buf) % 1_000_000_000;
            format!("run_{ms}_{nonce}")
        }
        Err(_) => {
            let counter = RUN_ID_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
            format!("run_{ms}_{}_{counter}", std::process::id())
        }
    }
}

/// Create a fresh run directory under `runs_dir`.
pub fn create_run_dir(runs_dir: &Path) -> Result<(String, PathBuf), NoemaError> {
    let run_id = generate_run_id();
    let path = runs_dir.join(&run_id);
    std::fs::create_dir_all(&path)?;
    Ok((run_id, path))
}

/// Write bytes via a temporary sibling and an atomic rename, mode 0644.
pub fn save_file(dst: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = dst.parent().unwrap_or_else(|| Path::new("."));
    let base = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);
    let tmp = dir.join(format!(
        "{base}.tmp-{}-{}",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let result = (|| {
        std::fs::write(&tmp, data)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o644))?;
        }
        let file = std::fs::File::open(&tmp)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp, dst)
    })();
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

/// Serialize a value as pretty JSON and write it atomically, then sync the
/// containing directory.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), NoemaError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    save_file(path, &bytes)?;
    if let Some(dir) = path.parent() {
        if let Ok(handle) = std::fs::File::open(dir) {
            let _ = handle.sync_all();
        }
    }
    Ok(())
}

/// One run header in `index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIndexEntry {
    /// Run identifier.
    pub run_id: String,
    /// `PASS` or `FAIL`.
    pub status: String,
    /// Unix seconds of completion.
    #[serde(rename = "ts")]
    pub timestamp: i64,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_name: Option<String>,
}

/// Prepend an entry to the run index, newest first, bounded by `limit`.
///
/// A corrupted index is archived as `index.json.corrupt-<ms>` and reported
/// as a non-fatal warning; the index restarts from this entry.
pub fn update_runs_index(
    runs_dir: &Path,
    limit: usize,
    entry: RunIndexEntry,
) -> Result<(), NoemaError> {
    if limit == 0 {
        return Ok(());
    }
    let index_path = runs_dir.join("index.json");
    let mut entries: Vec<RunIndexEntry> = Vec::new();
    if let Ok(raw) = std::fs::read(&index_path) {
        match serde_json::from_slice(&raw) {
            Ok(existing) => entries = existing,
            Err(_) => {
                let backup = runs_dir.join(format!("index.json.corrupt-{}", unix_millis()));
                match std::fs::rename(&index_path, &backup) {
                    Ok(()) => tracing::warn!(
                        backup = %backup.display(),
                        "runs index corrupted; archived and starting fresh"
                    ),
                    Err(e) => tracing::warn!(
                        "runs index corrupted; failed to archive: {e}"
                    ),
                }
            }
        }
    }
    entries.insert(0, entry);
    entries.truncate(limit);
    save_json(&index_path, &entries)
}

/// Load the run index; a missing file is an empty index.
pub fn load_runs_index(runs_dir: &Path) -> Vec<RunIndexEntry> {
    std::fs::read(runs_dir.join("index.json"))
        .ok()
        .and_then(|raw| serde_json::from_slice(&raw).ok())
        .unwrap_or_default()
}

/// Delete `run_*` directories beyond the newest `max_runs`, ordered by
/// mtime descending. `max_runs == 0` disables pruning; a missing runs dir
/// is not an error.
pub fn prune_runs(runs_dir: &Path, max_runs: usize) -> std::io::Result<()> {
    if max_runs == 0 {
        return Ok(());
    }
    let entries = match std::fs::read_dir(runs_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let mut runs: Vec<(PathBuf, SystemTime)> = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with("run_") {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_dir() {
            continue;
        }
        let modified = meta.modified().unwrap_or(UNIX_EPOCH);
        runs.push((entry.path(), modified));
    }

    if runs.len() <= max_runs {
        return Ok(());
    }
    runs.sort_by(|a, b| b.1.cmp(&a.1));
    for (path, _) in runs.drain(max_runs..) {
        std::fs::remove_dir_all(&path)?;
    }
    Ok(())
}
