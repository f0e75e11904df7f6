use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tempfile::NamedTempFile;

use crate::error::ExtractError;

const ARTIFACT_PREFIX: &str = "batchlinks_";
const ARTIFACT_SUFFIX: &str = ".txt";

/// Append-only destination for extracted lines
pub trait TextSink {
    /// Append one line; the line terminator is added by the sink
    fn append_line(&mut self, line: &str) -> Result<(), ExtractError>;
}

impl TextSink for Vec<String> {
    fn append_line(&mut self, line: &str) -> Result<(), ExtractError> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Header written at the top of every artifact
#[derive(Debug, Clone)]
pub struct ArtifactHeader {
    pub batch_name: String,
    pub resolution: String,
    pub generated_at: DateTime<Local>,
}

/// Uniquely named temporary text file holding one export.
///
/// The file is removed when the artifact is closed or dropped, so it never
/// outlives the session that created it.
pub struct Artifact {
    file: NamedTempFile,
}

impl Artifact {
    /// Create an empty artifact inside `dir`
    pub fn create(dir: &Path) -> std::io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(ARTIFACT_PREFIX)
            .suffix(ARTIFACT_SUFFIX)
            .tempfile_in(dir)?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn write_header(&mut self, header: &ArtifactHeader) -> Result<(), ExtractError> {
        self.append_line(&format!("Batch: {}", header.batch_name))?;
        self.append_line(&format!("Resolution: {}", header.resolution))?;
        self.append_line(&format!(
            "Generated: {}",
            header.generated_at.format("%Y-%m-%d %H:%M:%S")
        ))?;
        self.append_line("")
    }

    /// Flush and delete the file, reporting removal failures
    pub fn close(mut self) -> Result<(), (PathBuf, std::io::Error)> {
        let path = self.path().to_path_buf();
        if let Err(e) = self.file.flush() {
            tracing::warn!(path = %path.display(), error = %e, "failed to flush artifact");
        }
        self.file.close().map_err(|e| (path, e))
    }
}

impl TextSink for Artifact {
    fn append_line(&mut self, line: &str) -> Result<(), ExtractError> {
        writeln!(self.file, "{line}").map_err(|e| ExtractError::Io {
            path: self.file.path().to_path_buf(),
            source: e,
        })
    }
}
