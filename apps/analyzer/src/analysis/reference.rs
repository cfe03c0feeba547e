use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::extraction::DocumentFormat;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("document reference is empty")]
    Empty,

    #[error("unsupported document format '{extension}' (expected {})", DocumentFormat::supported())]
    UnsupportedFormat { extension: String },

    #[error("document reference '{0}' has no owner segment")]
    MissingOwner(String),
}

/// Stored-object path of an uploaded resume: `{ownerId}/{timestamp}.{ext}`.
///
/// Parsing validates the extension before anything else, so an unsupported
/// suffix is always reported as `UnsupportedFormat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReference {
    path: String,
    owner_len: usize,
    format: DocumentFormat,
}

impl DocumentReference {
    pub fn parse(raw: &str) -> Result<Self, ReferenceError> {
        let path = raw.trim();
        if path.is_empty() {
            return Err(ReferenceError::Empty);
        }

        let file_name = path.rsplit('/').next().unwrap_or(path);
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default();
        let format = DocumentFormat::from_extension(extension).ok_or_else(|| {
            ReferenceError::UnsupportedFormat {
                extension: extension.to_string(),
            }
        })?;

        let owner_len = match path.split_once('/') {
            Some((owner, rest)) if !owner.is_empty() && !rest.is_empty() => owner.len(),
            _ => return Err(ReferenceError::MissingOwner(path.to_string())),
        };

        Ok(Self {
            path: path.to_string(),
            owner_len,
            format,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// The first path segment.
    pub fn owner_id(&self) -> &str {
        &self.path[..self.owner_len]
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl Serialize for DocumentReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path)
    }
}
