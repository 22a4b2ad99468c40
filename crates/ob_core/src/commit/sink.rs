use super::error::CommitError;
use super::format::{decode, encode, ContestOutput};

use std::collections::BTreeMap;
use std::fs::{self, remove_file, rename, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Destination for completed contests.
///
/// A commit either lands the whole contest or nothing; readers never see a
/// partially written contest.
pub trait ResultSink: Send + Sync {
    fn commit(&self, output: &ContestOutput) -> Result<(), CommitError>;
}

/// One `<contest>.obr` file per contest under a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub const EXTENSION: &'static str = "obr";

    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CommitError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, contest_id: &str) -> PathBuf {
        let safe: String = contest_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.{}", safe, Self::EXTENSION))
    }

    pub fn exists(&self, contest_id: &str) -> bool {
        self.path_for(contest_id).exists()
    }

    pub fn load(&self, contest_id: &str) -> Result<ContestOutput, CommitError> {
        Self::load_from_path(&self.path_for(contest_id))
    }

    pub fn load_from_path(path: &Path) -> Result<ContestOutput, CommitError> {
        if !path.exists() {
            return Err(CommitError::Missing { path: path.to_path_buf() });
        }
        let data = fs::read(path)?;
        let output = decode(&data)?;
        log::debug!("Loaded {} bytes from {:?}", data.len(), path);
        Ok(output)
    }

    fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CommitError> {
        let temp_path = path.with_extension("tmp");

        let written = (|| -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(data)?;
            file.flush()?;
            file.sync_all()?;
            rename(&temp_path, path)
        })();

        if let Err(err) = written {
            if temp_path.exists() {
                let _ = remove_file(&temp_path);
            }
            return Err(err.into());
        }
        Ok(())
    }
}

impl ResultSink for FileSink {
    fn commit(&self, output: &ContestOutput) -> Result<(), CommitError> {
        let data = encode(output)?;
        let path = self.path_for(&output.contest_id);
        Self::write_atomic(&path, &data)?;
        log::info!("Committed contest {} ({} rows, {} bytes)", output.contest_id, output.row_count(), data.len());
        Ok(())
    }
}

/// In-memory sink keyed by contest id.
#[derive(Debug, Default)]
pub struct MemorySink {
    outputs: Mutex<BTreeMap<String, ContestOutput>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, contest_id: &str) -> Option<ContestOutput> {
        self.outputs.lock().ok()?.get(contest_id).cloned()
    }

    pub fn contest_ids(&self) -> Vec<String> {
        self.outputs.lock().map(|m| m.keys().cloned().collect()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.outputs.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultSink for MemorySink {
    fn commit(&self, output: &ContestOutput) -> Result<(), CommitError> {
        let mut outputs = self
            .outputs
            .lock()
            .map_err(|_| CommitError::SinkUnavailable("memory sink lock poisoned".to_string()))?;
        outputs.insert(output.contest_id.clone(), output.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_commit_load() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::new(temp_dir.path().join("out")).unwrap();
        let output = ContestOutput::new("0022300001");

        sink.commit(&output).unwrap();
        assert!(sink.exists("0022300001"));
        assert_eq!(sink.load("0022300001").unwrap(), output);
    }

    #[test]
    fn test_atomic_commit_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::new(temp_dir.path()).unwrap();
        sink.commit(&ContestOutput::new("g1")).unwrap();

        let path = sink.path_for("g1");
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_failed_write_leaves_nothing_visible() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::new(temp_dir.path()).unwrap();
        // A directory squatting on the target makes the rename fail
        fs::create_dir_all(sink.path_for("g1")).unwrap();

        assert!(sink.commit(&ContestOutput::new("g1")).is_err());
        assert!(!sink.path_for("g1").with_extension("tmp").exists());
        assert!(sink.load("g1").is_err());
    }

    #[test]
    fn test_recommit_replaces_output() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::new(temp_dir.path()).unwrap();
        let mut output = ContestOutput::new("g1");
        sink.commit(&output).unwrap();
        output.diagnostics.duplicates_dropped = 3;
        sink.commit(&output).unwrap();
        assert_eq!(sink.load("g1").unwrap().diagnostics.duplicates_dropped, 3);
    }

    #[test]
    fn test_missing_contest_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::new(temp_dir.path()).unwrap();
        assert!(matches!(sink.load("nope"), Err(CommitError::Missing { .. })));
    }

    #[test]
    fn test_path_for_sanitizes_ids() {
        let sink = FileSink { dir: PathBuf::from("/tmp/out") };
        assert_eq!(sink.path_for("a/b c"), PathBuf::from("/tmp/out/a_b_c.obr"));
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.commit(&ContestOutput::new("g2")).unwrap();
        sink.commit(&ContestOutput::new("g1")).unwrap();
        assert_eq!(sink.contest_ids(), vec!["g1", "g2"]);
        assert!(sink.get("g1").is_some());
        assert!(sink.get("g3").is_none());
    }
}
