//! Image payloads selected for upload

use std::fmt;
use std::path::Path;

use crate::Result;

/// An image chosen by the operator.
///
/// A zero-length file is the explicit "clear image" signal and is never
/// uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// The "remove this image" signal
    #[must_use]
    pub fn empty() -> Self {
        Self::new("", "application/octet-stream", Vec::new())
    }

    /// Read an image from disk, guessing its content type from the extension
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self::new(file_name, content_type, bytes))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_the_clear_signal() {
        assert!(ImageFile::empty().is_empty());
        assert!(!ImageFile::new("a.png", "image/png", vec![1]).is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn from_path_guesses_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        std::fs::write(&path, [0x89, 0x50, 0x4e, 0x47]).unwrap();

        let image = ImageFile::from_path(&path).await.unwrap();
        assert_eq!(image.file_name, "cover.png");
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.len(), 4);
    }

    #[test]
    fn debug_omits_bytes() {
        let image = ImageFile::new("a.jpg", "image/jpeg", vec![7; 64]);
        let rendered = format!("{image:?}");
        assert!(rendered.contains("len: 64"));
        assert!(!rendered.contains("7, 7"));
    }
}
