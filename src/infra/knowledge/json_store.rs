use crate::core::knowledge::{KnowledgeBase, KnowledgeStore, StoreError};
use async_trait::async_trait;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// JSON file knowledge store. The whole base lives in one file:
/// { "questions": [ { "question": ..., "answer": ... } ] }
///
/// Writes go to a temp file in the same directory which is then renamed over
/// the target, so a crash mid-write leaves the previous file intact.
///
/// This type does not serialize concurrent `persist` calls itself; the
/// knowledge service holds its write lock across every persist.
pub struct JsonKnowledgeStore {
    path: PathBuf,
}

impl JsonKnowledgeStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `Ok(None)` when the file is missing or holds only whitespace.
    fn read_existing(path: &Path) -> Result<Option<KnowledgeBase>, StoreError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(StoreError::Corrupt {
                    path: path.to_path_buf(),
                    reason: "file is not valid UTF-8".to_string(),
                })
            }
            Err(e) => {
                return Err(StoreError::ReadFailure {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    fn write_atomic(path: &Path, base: &KnowledgeBase) -> Result<(), StoreError> {
        let fail = |e: io::Error| StoreError::WriteFailure {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(fail)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(fail)?;
        Self::write_pretty(tmp.as_file_mut(), base).map_err(fail)?;
        tmp.as_file().sync_all().map_err(fail)?;

        // Rename over the target. On failure the temp file is removed on drop.
        tmp.persist(path).map_err(|e| fail(e.error))?;
        Ok(())
    }

    fn write_pretty(file: &mut File, base: &KnowledgeBase) -> io::Result<()> {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, base)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

#[async_trait]
impl KnowledgeStore for JsonKnowledgeStore {
    async fn load(&self) -> Result<KnowledgeBase, StoreError> {
        let path = self.path.clone();
        let join_err = |e: tokio::task::JoinError| StoreError::ReadFailure {
            path: self.path.clone(),
            reason: e.to_string(),
        };

        tokio::task::spawn_blocking(move || match Self::read_existing(&path)? {
            Some(base) => Ok(base),
            None => {
                tracing::info!(path = %path.display(), "Creating empty knowledge base");
                let base = KnowledgeBase::new();
                Self::write_atomic(&path, &base)?;
                Ok(base)
            }
        })
        .await
        .map_err(join_err)?
    }

    async fn persist(&self, base: &KnowledgeBase) -> Result<(), StoreError> {
        let path = self.path.clone();
        let base = base.clone();
        let join_err = |e: tokio::task::JoinError| StoreError::WriteFailure {
            path: self.path.clone(),
            reason: e.to_string(),
        };

        tokio::task::spawn_blocking(move || Self::write_atomic(&path, &base))
            .await
            .map_err(join_err)?
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
