use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaValidationError {
    #[error("media URI cannot be empty")]
    EmptyMediaUri,

    #[error("media URI is not a valid URL: {0}")]
    InvalidUrl(String),
}

//
// ─── MEDIA URI ─────────────────────────────────────────────────────────────────
//

/// Location of a video or thumbnail: either a remote URL or a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaUri {
    FilePath(PathBuf),
    Url(Url),
}

impl MediaUri {
    /// # Errors
    ///
    /// Returns `MediaValidationError::EmptyMediaUri` for an empty path.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, MediaValidationError> {
        let p = path.into();
        if p.as_os_str().is_empty() {
            return Err(MediaValidationError::EmptyMediaUri);
        }
        Ok(MediaUri::FilePath(p))
    }

    /// # Errors
    ///
    /// Returns `MediaValidationError` if the input is blank or not a URL.
    pub fn from_url(url: impl AsRef<str>) -> Result<Self, MediaValidationError> {
        let s = url.as_ref().trim();
        if s.is_empty() {
            return Err(MediaValidationError::EmptyMediaUri);
        }
        let u = Url::parse(s).map_err(|_| MediaValidationError::InvalidUrl(s.to_owned()))?;
        Ok(MediaUri::Url(u))
    }

    /// Parses persisted text: anything with a scheme is a URL, the rest a path.
    ///
    /// # Errors
    ///
    /// Returns `MediaValidationError` if the input is blank or a malformed URL.
    pub fn parse(raw: &str) -> Result<Self, MediaValidationError> {
        let s = raw.trim();
        if s.contains("://") {
            Self::from_url(s)
        } else {
            Self::from_file(s)
        }
    }

    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            MediaUri::FilePath(p) => Some(p.as_path()),
            MediaUri::Url(_) => None,
        }
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            MediaUri::Url(u) => Some(u),
            MediaUri::FilePath(_) => None,
        }
    }
}

impl fmt::Display for MediaUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaUri::FilePath(p) => write!(f, "{}", p.display()),
            MediaUri::Url(u) => f.write_str(u.as_str()),
        }
    }
}
