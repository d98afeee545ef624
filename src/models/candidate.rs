//! Candidate documents surfaced by pass one.
//!
//! A candidate is immutable once enumerated. Local and remote candidates are
//! modelled as one tagged variant with a uniform accessor surface so the
//! pipeline never branches on a scattered boolean flag.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a candidate document lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    /// A file on the local filesystem.
    Local { path: PathBuf },
    /// A file on a configured remote drive.
    Remote { drive: String, file_id: String },
}

impl Origin {
    /// Stable identifier used in progress events and report rows.
    pub fn identifier(&self) -> String {
        match self {
            Origin::Local { path } => path.display().to_string(),
            Origin::Remote { drive, file_id } => format!("{}:{}", drive, file_id),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Origin::Local { .. })
    }

    /// Local path, if this candidate lives on the filesystem.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Origin::Local { path } => Some(path),
            Origin::Remote { .. } => None,
        }
    }
}

/// A document discovered by a source enumerator, before content analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDocument {
    pub origin: Origin,
    /// Display name (filename for local, remote name for drive files).
    pub display_name: String,
    /// Size in bytes, when the source reports one.
    pub size: u64,
    /// Modification timestamp, when the source reports one.
    pub modified: Option<DateTime<Utc>>,
    /// MIME type hint from the source (declared type for remote files,
    /// extension-based guess for local ones).
    pub mime_hint: Option<String>,
}

impl CandidateDocument {
    /// Build a candidate for a local file.
    pub fn local(path: PathBuf, size: u64, modified: Option<DateTime<Utc>>) -> Self {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let mime_hint = mime_guess::from_path(&path)
            .first()
            .map(|m| m.essence_str().to_string());
        Self {
            origin: Origin::Local { path },
            display_name,
            size,
            modified,
            mime_hint,
        }
    }

    /// Build a candidate for a remote drive file.
    pub fn remote(
        drive: String,
        file_id: String,
        display_name: String,
        size: u64,
        modified: Option<DateTime<Utc>>,
        mime_type: String,
    ) -> Self {
        Self {
            origin: Origin::Remote { drive, file_id },
            display_name,
            size,
            modified,
            mime_hint: Some(mime_type),
        }
    }

    /// Filename stem used for rule matching.
    pub fn stem(&self) -> String {
        Path::new(&self.display_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.display_name.clone())
    }

    /// Lowercased filename extension, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.display_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}
