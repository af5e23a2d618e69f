//! Intermediate offset artifact.
//!
//! One line per entry, `topic,partition,offset\n`, no header and no quoting.
//! This is the `--from-file` format of `kafka-consumer-groups --reset-offsets`
//! and must stay byte-stable.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::snapshot::OffsetSnapshot;
use crate::{Error, Result};

const DELIMITER: char = ',';

/// Render a snapshot in artifact format.
pub fn render(snapshot: &OffsetSnapshot) -> String {
    let mut out = String::new();
    for entry in snapshot.entries() {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{}{DELIMITER}{}{DELIMITER}{}",
            entry.topic, entry.partition, entry.offset
        );
    }
    out
}

/// Write a snapshot to `path`, replacing any existing file.
pub fn write(snapshot: &OffsetSnapshot, path: &Path) -> Result<()> {
    fs::write(path, render(snapshot)).map_err(|e| Error::artifact(path, e))?;
    debug!("Wrote {} offsets to {}", snapshot.len(), path.display());
    Ok(())
}

/// Parse artifact text back into a snapshot. Blank lines are skipped.
pub fn parse(content: &str) -> Result<OffsetSnapshot> {
    let mut snapshot = OffsetSnapshot::new();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        // Everything left of the last two delimiters is the topic.
        let mut fields = line.rsplitn(3, DELIMITER);
        let (offset, partition, topic) = match (fields.next(), fields.next(), fields.next()) {
            (Some(o), Some(p), Some(t)) if !t.is_empty() => (o, p, t),
            _ => {
                return Err(Error::Serialization(format!(
                    "line {}: expected topic,partition,offset but found {:?}",
                    index + 1,
                    line
                )))
            }
        };

        let partition: i32 = partition.parse().map_err(|_| {
            Error::Serialization(format!("line {}: invalid partition {:?}", index + 1, partition))
        })?;
        let offset: i64 = offset.parse().map_err(|_| {
            Error::Serialization(format!("line {}: invalid offset {:?}", index + 1, offset))
        })?;

        snapshot.insert(topic, partition, offset);
    }

    Ok(snapshot)
}

/// Read and parse the artifact at `path`.
pub fn read(path: &Path) -> Result<OffsetSnapshot> {
    let content = fs::read_to_string(path).map_err(|e| Error::artifact(path, e))?;
    parse(&content)
}

/// Handle to an artifact file on disk.
///
/// The file is removed by [`remove`](Self::remove). A handle dropped without
/// being removed deletes the file best-effort, so error and panic paths do
/// not leave offsets behind.
#[derive(Debug)]
pub struct IntermediateArtifact {
    path: PathBuf,
    removed: bool,
}

impl IntermediateArtifact {
    /// Write `snapshot` to `path` and take ownership of the file.
    ///
    /// A partially written file is removed before the error is returned.
    pub fn create(snapshot: &OffsetSnapshot, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Err(e) = write(snapshot, &path) {
            if let Err(cleanup) = fs::remove_file(&path) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove partial artifact {}: {}", path.display(), cleanup);
                }
            }
            return Err(e);
        }
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file.
    pub fn remove(mut self) -> Result<()> {
        self.removed = true;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("{} was already gone", self.path.display());
                Ok(())
            }
            Err(e) => Err(Error::artifact(&self.path, e)),
        }
    }
}

impl Drop for IntermediateArtifact {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}
