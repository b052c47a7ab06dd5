//! JSONL substrate: one fact per line.
//!
//! Saving replaces the target atomically: lines go to a sibling temp
//! file, which is fsynced and renamed over the target, and the parent
//! directory is fsynced afterwards so the rename itself survives a
//! crash. Loading verifies every stored id against the recomputed
//! content hash of its predicate, so a hand-edited or bit-rotted
//! substrate is rejected instead of silently trusted.

use crate::predicate::{Fact, FactId};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Errors from substrate reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("corrupted substrate: {0}")]
    Corrupt(String),
}

impl JsonlError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Load facts from a JSONL file.
///
/// Blank lines and `#` comments are skipped. Every fact's stored id must
/// match the recomputed hash of its predicate; one mismatch rejects the
/// whole substrate.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<Fact>, JsonlError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| JsonlError::io(path, e))?;
    if bytes.contains(&0) {
        return Err(JsonlError::Corrupt(format!(
            "{}: contains NUL byte(s)",
            path.display()
        )));
    }
    let text = String::from_utf8(bytes).map_err(|_| {
        JsonlError::Corrupt(format!(
            "{}: contains non-UTF-8 byte sequence(s)",
            path.display()
        ))
    })?;

    let mut facts = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fact: Fact = serde_json::from_str(line).map_err(|e| JsonlError::Malformed {
            path: path.to_path_buf(),
            line: idx + 1,
            message: e.to_string(),
        })?;
        let expected = FactId::of(&fact.pred);
        if fact.id != expected {
            return Err(JsonlError::Corrupt(format!(
                "{}:{}: fact id {} does not match its content hash {expected}",
                path.display(),
                idx + 1,
                fact.id,
            )));
        }
        facts.push(fact);
    }
    Ok(facts)
}

/// Save facts to a JSONL file, replacing it atomically.
pub fn save<'a>(
    path: impl AsRef<Path>,
    facts: impl IntoIterator<Item = &'a Fact>,
) -> Result<(), JsonlError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| JsonlError::io(&parent, e))?;

    let tmp = sibling_tmp_path(&parent, path);
    if let Err(error) = write_lines(&tmp, facts) {
        let _ = fs::remove_file(&tmp);
        return Err(error);
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        JsonlError::io(path, e)
    })?;

    // The rename is only durable once the directory entry itself is
    // flushed.
    let dir = File::open(&parent).map_err(|e| JsonlError::io(&parent, e))?;
    dir.sync_all().map_err(|e| JsonlError::io(&parent, e))?;
    Ok(())
}

fn write_lines<'a>(
    tmp: &Path,
    facts: impl IntoIterator<Item = &'a Fact>,
) -> Result<(), JsonlError> {
    let file = File::create(tmp).map_err(|e| JsonlError::io(tmp, e))?;
    let mut writer = BufWriter::new(file);
    for fact in facts {
        serde_json::to_writer(&mut writer, fact)
            .map_err(|e| JsonlError::Serialize(e.to_string()))?;
        writer.write_all(b"\n").map_err(|e| JsonlError::io(tmp, e))?;
    }
    writer.flush().map_err(|e| JsonlError::io(tmp, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| JsonlError::io(tmp, e.into_error()))?;
    file.sync_all().map_err(|e| JsonlError::io(tmp, e))
}

fn sibling_tmp_path(parent: &Path, path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "facts".to_string());
    parent.join(format!(".{stem}.{}.{unique:x}.tmp", std::process::id()))
}
