//! Filesystem query source.
//!
//! A query directory looks like:
//!
//! ```text
//! queries/
//! ├── endpoint.txt        # first non-blank line: endpoint for every query here
//! ├── books_by_genre.rq   # SPARQL text with #+ decorators
//! └── books.json          # object-form query
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::decorator::RawQuery;
use crate::endpoint::EndpointHintSource;

/// Name of the endpoint hint file next to the queries.
pub const ENDPOINT_HINT_FILE: &str = "endpoint.txt";

/// Extensions loaded as SPARQL text.
pub const TEXT_EXTENSIONS: &[&str] = &["rq", "sparql"];

/// Extension loaded as an object-form query.
pub const OBJECT_EXTENSION: &str = "json";

/// Result type for loading queries.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors loading a query file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("query file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON query in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported query file extension: {0}")]
    UnsupportedExtension(PathBuf),
}

/// A query file on disk.
#[derive(Debug, Clone)]
pub struct FsQuerySource {
    path: PathBuf,
}

impl FsQuerySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Query name: the file stem.
    pub fn name(&self) -> Option<&str> {
        self.path.file_stem().and_then(|s| s.to_str())
    }

    /// Read the query: text for `.rq`/`.sparql`, a JSON object for `.json`.
    pub fn load(&self) -> LoadResult<RawQuery> {
        if !self.path.is_file() {
            return Err(LoadError::NotFound(self.path.clone()));
        }

        let extension = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some(ext) if TEXT_EXTENSIONS.contains(&ext) => {
                debug!(path = %self.path.display(), "Loading text query");
                Ok(RawQuery::Text(self.read()?))
            }
            Some(OBJECT_EXTENSION) => {
                debug!(path = %self.path.display(), "Loading object-form query");
                let text = self.read()?;
                let value = serde_json::from_str(&text).map_err(|source| LoadError::Json {
                    path: self.path.clone(),
                    source,
                })?;
                Ok(RawQuery::Structured(value))
            }
            _ => Err(LoadError::UnsupportedExtension(self.path.clone())),
        }
    }

    /// Path of the endpoint hint file for this query.
    pub fn hint_path(&self) -> PathBuf {
        self.path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(ENDPOINT_HINT_FILE)
    }

    fn read(&self) -> LoadResult<String> {
        fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl EndpointHintSource for FsQuerySource {
    fn endpoint_text(&self) -> Option<String> {
        let path = self.hint_path();
        match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!(path = %path.display(), "No endpoint hint: {}", e);
                None
            }
        }
    }
}

/// Query files directly inside `dir`, sorted by path.
pub fn discover(dir: &Path) -> LoadResult<Vec<FsQuerySource>> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| LoadError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                TEXT_EXTENSIONS.contains(&e.as_str()) || e == OBJECT_EXTENSION
            })
            .unwrap_or(false);
        if path.is_file() && supported {
            sources.push(FsQuerySource::new(path));
        }
    }
    sources.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(sources)
}
