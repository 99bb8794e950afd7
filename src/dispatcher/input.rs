//! Input corpus access and unit segmentation.
//!
//! Every reader opens the source on its own and runs its own `UnitScanner`
//! over it, so routing is filter-based rather than a shared cursor. All readers
//! use the same segmentation rules and therefore see the same unit sequence:
//!
//! - Between units, a line equal to a registered genre name opens a unit.
//!   Any other line is ignored.
//! - Inside a unit, every line up to the next blank line (or end of input) is
//!   body, even if it happens to spell a genre name.

use crate::error::{ClusterError, Result};
use crate::transform::TransformRegistry;
use crate::unit::Unit;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

#[derive(Debug, Clone)]
pub enum InputSource {
    File(PathBuf),
    /// In-memory corpus, mainly for embedding and tests.
    Text(Arc<[u8]>),
}

impl InputSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn text(text: &str) -> Self {
        Self::Text(Arc::from(text.as_bytes()))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Text(_) => None,
        }
    }

    fn input_error(&self, source: std::io::Error) -> ClusterError {
        ClusterError::Input {
            path: self.path().map(Path::to_path_buf).unwrap_or_default(),
            source,
        }
    }

    /// Fails fast if the source cannot be opened.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::File(path) => std::fs::File::open(path)
                .map(|_| ())
                .map_err(|e| self.input_error(e)),
            Self::Text(_) => Ok(()),
        }
    }

    /// Opens an independent reader positioned at the start of the corpus.
    pub async fn open(&self) -> Result<Box<dyn AsyncBufRead + Send + Unpin>> {
        match self {
            Self::File(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|e| self.input_error(e))?;
                Ok(Box::new(BufReader::new(file)))
            }
            Self::Text(bytes) => Ok(Box::new(std::io::Cursor::new(bytes.clone()))),
        }
    }
}

pub struct UnitScanner<R> {
    lines: Lines<R>,
    registry: Arc<TransformRegistry>,
    source: InputSource,
}

impl<R> UnitScanner<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R, registry: Arc<TransformRegistry>, source: InputSource) -> Self {
        Self {
            lines: reader.lines(),
            registry,
            source,
        }
    }

    async fn next_line(&mut self) -> Result<Option<String>> {
        self.lines
            .next_line()
            .await
            .map_err(|e| self.source.input_error(e))
    }

    /// Returns the next unit of any registered genre, or `None` at end of input.
    pub async fn next_unit(&mut self) -> Result<Option<Unit>> {
        let header = loop {
            match self.next_line().await? {
                Some(line) if self.registry.match_header(&line).is_some() => break line,
                Some(_) => continue,
                None => return Ok(None),
            }
        };

        let mut body = Vec::new();
        while let Some(line) = self.next_line().await? {
            if line.is_empty() {
                break;
            }
            body.push(line);
        }

        Ok(Some(Unit::new(header, body)))
    }
}
