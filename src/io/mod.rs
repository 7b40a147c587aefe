//! Mesh file output.
//!
//! Generated quads are exported through a [`QuadSoup`].
//!
//! # Supported Formats
//!
//! | Format | Extension | Save | Notes |
//! |--------|-----------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | Quad faces, 1-based indices |
//!
//! # Usage
//!
//! ```no_run
//! use quadpatch::io::save;
//! use quadpatch::mesh::QuadSoup;
//!
//! let soup = QuadSoup::new();
//! save(&soup, "output.obj").unwrap();
//! ```

pub mod obj;

use std::path::Path;

use crate::error::{PatternError, Result};
use crate::mesh::QuadSoup;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

/// Save a quad soup with automatic format detection.
///
/// The format is determined by the file extension.
pub fn save<P: AsRef<Path>>(soup: &QuadSoup, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| PatternError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })?;

    match format {
        Format::Obj => obj::save(soup, path),
    }
}
