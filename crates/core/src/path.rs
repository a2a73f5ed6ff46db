//! Content path types and validation.
//!
//! A [`ContentPath`] can only be built through validation, so any value of the
//! type carries an allow-listed namespace (or none) and a relative filename
//! that cannot climb out of its content root.

use crate::error::PathError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Top-level class of served content. Each class has its own content root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentClass {
    /// Executable scripts, optionally scoped to an OS namespace.
    Scripts,
    /// Binary artifacts. Never namespaced.
    Bin,
}

impl ContentClass {
    /// Key prefix used for remote lookups and cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scripts => "scripts",
            Self::Bin => "bin",
        }
    }
}

impl fmt::Display for ContentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating-system family namespace for scripts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Windows,
    Linux,
    Darwin,
}

impl Namespace {
    /// The namespace allow-list.
    pub const ALL: [Namespace; 3] = [Self::Windows, Self::Linux, Self::Darwin];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::Darwin => "darwin",
        }
    }
}

impl FromStr for Namespace {
    type Err = PathError;

    /// Case-sensitive match against the allow-list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ns| ns.as_str() == s)
            .ok_or_else(|| PathError::UnknownNamespace(s.to_string()))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated request for a piece of content.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContentPath {
    class: ContentClass,
    namespace: Option<Namespace>,
    filename: String,
}

impl ContentPath {
    /// Validate a (class, namespace, filename) triple.
    ///
    /// The namespace, when present, must be one of
    /// [`ALLOWED_NAMESPACES`](crate::ALLOWED_NAMESPACES) and is only accepted
    /// for scripts.
    pub fn new(
        class: ContentClass,
        namespace: Option<&str>,
        filename: &str,
    ) -> Result<Self, PathError> {
        let namespace = match namespace {
            Some(ns) => {
                let ns = ns.parse::<Namespace>()?;
                if class != ContentClass::Scripts {
                    return Err(PathError::NamespaceNotAllowed {
                        class: class.as_str(),
                    });
                }
                Some(ns)
            }
            None => None,
        };

        validate_filename(filename)?;

        Ok(Self {
            class,
            namespace,
            filename: filename.to_string(),
        })
    }

    /// Parse the remainder of a `/scripts/...` request.
    ///
    /// With two or more segments the first one is the namespace
    /// (`linux/setup.sh`); a single segment is a root script (`setup.sh`).
    pub fn parse_script(path: &str) -> Result<Self, PathError> {
        match path.split_once('/') {
            Some((namespace, filename)) => {
                Self::new(ContentClass::Scripts, Some(namespace), filename)
            }
            None => Self::new(ContentClass::Scripts, None, path),
        }
    }

    /// Parse the remainder of a `/bin/...` request. Binaries have no namespace.
    pub fn parse_bin(path: &str) -> Result<Self, PathError> {
        Self::new(ContentClass::Bin, None, path)
    }

    pub fn class(&self) -> ContentClass {
        self.class
    }

    pub fn namespace(&self) -> Option<Namespace> {
        self.namespace
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Path relative to the class content root, e.g. `linux/setup.sh`.
    pub fn relative_path(&self) -> String {
        match self.namespace {
            Some(ns) => format!("{ns}/{}", self.filename),
            None => self.filename.clone(),
        }
    }

    /// Fully qualified key, e.g. `scripts/linux/setup.sh`.
    ///
    /// Used as the remote URL suffix and as the cache key.
    pub fn key(&self) -> String {
        format!("{}/{}", self.class, self.relative_path())
    }
}

impl fmt::Debug for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentPath({})", self.key())
    }
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Longest single path segment any common filesystem will store.
const MAX_SEGMENT_LEN: usize = 255;

/// Upper bound on the whole relative filename, well under `PATH_MAX`.
const MAX_FILENAME_LEN: usize = 1024;

fn validate_filename(filename: &str) -> Result<(), PathError> {
    if filename.is_empty() {
        return Err(PathError::InvalidFilename(
            "filename cannot be empty".to_string(),
        ));
    }

    if filename.contains('\0') || filename.contains('\\') {
        return Err(PathError::InvalidFilename(format!(
            "invalid character in filename: {filename:?}"
        )));
    }

    if filename.starts_with('/') {
        return Err(PathError::InvalidFilename(format!(
            "absolute paths not allowed: {filename}"
        )));
    }

    if filename.len() > MAX_FILENAME_LEN {
        return Err(PathError::InvalidFilename(format!(
            "filename longer than {MAX_FILENAME_LEN} bytes"
        )));
    }

    for segment in filename.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(PathError::InvalidFilename(format!(
                "unsafe path segment in: {filename}"
            )));
        }
        if segment.len() > MAX_SEGMENT_LEN {
            return Err(PathError::InvalidFilename(format!(
                "path segment longer than {MAX_SEGMENT_LEN} bytes"
            )));
        }
    }

    Ok(())
}
