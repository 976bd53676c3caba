//! Encoded output payloads.
//!
//! Both deliverables (static strip, animated strip) and the per-pose
//! stills are carried as encoded byte buffers tagged with a MIME type,
//! so the download collaborator can name files correctly without
//! inspecting the bytes.

/// An encoded artifact: raw bytes plus the metadata needed to hand it off.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Encoded payload.
    bytes: Vec<u8>,
    /// MIME type tag (e.g. "image/jpeg").
    mime: &'static str,
    /// File extension matching the MIME type, without the dot.
    extension: &'static str,
}

impl Artifact {
    /// Creates a new artifact from encoded bytes.
    pub fn new(bytes: Vec<u8>, mime: &'static str, extension: &'static str) -> Self {
        Self {
            bytes,
            mime,
            extension,
        }
    }

    /// Returns the encoded payload.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the artifact, returning the encoded payload.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Returns the MIME type tag.
    #[inline]
    pub fn mime(&self) -> &'static str {
        self.mime
    }

    /// Returns the file extension (without the dot).
    #[inline]
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// Returns the payload size in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Suggests a download filename: `<stem>-<unix millis>.<ext>`.
    pub fn suggested_filename(&self, stem: &str) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        format!("{}-{}.{}", stem, millis, self.extension)
    }
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_carries_extension() {
        let artifact = Artifact::new(vec![1, 2, 3], "image/png", "png");
        let name = artifact.suggested_filename("photoautomat-strip");
        assert!(name.starts_with("photoautomat-strip-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_len_matches_payload() {
        let artifact = Artifact::new(vec![0u8; 64], "image/jpeg", "jpg");
        assert_eq!(artifact.len(), 64);
        assert!(!artifact.is_empty());
    }
}
