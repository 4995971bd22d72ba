//! Where a loader reads its artifact from.
//!
//! The loader never reaches for a global blob; it is handed an
//! [`ArtifactSource`] when constructed. This keeps the bundled artifact, test
//! fixtures and on-disk artifacts interchangeable.

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A provider of raw artifact bytes.
pub trait ArtifactSource: Send + Sync {
    /// Reads the complete artifact.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while reading. A missing artifact is
    /// reported as [`io::ErrorKind::NotFound`].
    fn read(&self) -> io::Result<Cow<'_, [u8]>>;

    /// A short human-readable description used in logs and errors.
    fn describe(&self) -> String;
}

/// An artifact compiled into the binary.
#[derive(Debug, Clone, Copy)]
pub struct StaticArtifact(pub &'static [u8]);

impl ArtifactSource for StaticArtifact {
    fn read(&self) -> io::Result<Cow<'_, [u8]>> {
        Ok(Cow::Borrowed(self.0))
    }

    fn describe(&self) -> String {
        format!("bundled artifact ({} bytes)", self.0.len())
    }
}

/// An artifact held in memory, e.g. received from elsewhere or built in a test.
#[derive(Debug, Clone)]
pub struct BytesArtifact(Arc<[u8]>);

impl BytesArtifact {
    /// Wraps the given bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }
}

impl ArtifactSource for BytesArtifact {
    fn read(&self) -> io::Result<Cow<'_, [u8]>> {
        Ok(Cow::Borrowed(&self.0))
    }

    fn describe(&self) -> String {
        format!("in-memory artifact ({} bytes)", self.0.len())
    }
}

/// An artifact read from a file each time the loader needs it.
#[derive(Debug, Clone)]
pub struct FileArtifact {
    path: PathBuf,
}

impl FileArtifact {
    /// Points at the artifact file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The artifact's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArtifactSource for FileArtifact {
    fn read(&self) -> io::Result<Cow<'_, [u8]>> {
        std::fs::read(&self.path).map(Cow::Owned)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl<S: ArtifactSource + ?Sized> ArtifactSource for Box<S> {
    fn read(&self) -> io::Result<Cow<'_, [u8]>> {
        (**self).read()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_and_bytes_sources_borrow() {
        let source = StaticArtifact(b"TSGA");
        assert!(matches!(source.read().unwrap(), Cow::Borrowed(b"TSGA")));

        let source = BytesArtifact::new(vec![1, 2, 3]);
        assert_eq!(&*source.read().unwrap(), &[1, 2, 3]);
        assert_eq!(source.describe(), "in-memory artifact (3 bytes)");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileArtifact::new(dir.path().join("absent.grammar"));
        let err = source.read().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_boxed_source_delegates() {
        let source: Box<dyn ArtifactSource> = Box::new(StaticArtifact(b"abc"));
        assert_eq!(source.describe(), "bundled artifact (3 bytes)");
        assert_eq!(&*source.read().unwrap(), b"abc");
    }
}
