use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::load::{Load, LoadId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read load catalog `{path}`: {source}")]
    ReadFile { path: PathBuf, source: io::Error },
    #[error("could not parse load catalog `{path}`: {source}")]
    ParseFile { path: PathBuf, source: serde_json::Error },
}

/// Read-only snapshot of the loads currently on the board.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadCatalog {
    loads: Vec<Load>,
}

impl LoadCatalog {
    pub fn new(loads: Vec<Load>) -> Self {
        Self { loads }
    }

    /// Reads a JSON array of loads. A missing file is an empty board, not an error.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(CatalogError::ReadFile { path: path.to_path_buf(), source })
            }
        };

        Self::from_json_str(&raw)
            .map_err(|source| CatalogError::ParseFile { path: path.to_path_buf(), source })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Vec<Load>>(raw).map(Self::new)
    }

    pub fn loads(&self) -> &[Load] {
        &self.loads
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    pub fn find(&self, load_id: &LoadId) -> Option<&Load> {
        self.loads.iter().find(|load| &load.load_id == load_id)
    }
}
