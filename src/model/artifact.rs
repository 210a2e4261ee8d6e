//! Artifacts handed from one pipeline step to the next.

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Location of the persisted photo for the current session.
///
/// Created by [`CaptureService`](crate::capture::CaptureService) once the
/// frame is on disk; every later step only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRef {
    path: PathBuf,
    len: u64,
}

impl PhotoRef {
    pub fn new(path: impl Into<PathBuf>, len: u64) -> Self {
        Self {
            path: path.into(),
            len,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the encoded image in bytes, as written.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Display for PhotoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Short natural-language description of the photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption(String);

impl Caption {
    /// Wraps caption text, trimming surrounding whitespace.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Caption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Poem text exactly as the generation service returned it.
///
/// No structural validation happens here: an off-format poem still prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poem(String);

impl Poem {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.0.lines()
    }
}

impl Display for Poem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
