// SPDX-License-Identifier: MIT

use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    InvalidSize(String),
    UnknownTag(String),
    SliceOutOfRange(&'static str, u8),
    InvalidConfig(&'static str),
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::InvalidSize(s) => {
                write!(f, "Invalid size format '{s}'. Use 'max', a sector count or a K, M or G suffix.")
            }
            ManifestError::UnknownTag(s) => write!(f, "Unknown slice tag '{s}'"),
            ManifestError::SliceOutOfRange(what, id) => {
                write!(f, "{what}: slice {id} is out of range (0-15)")
            }
            ManifestError::InvalidConfig(msg) => write!(f, "Invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ManifestError {}
