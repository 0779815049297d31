// src/compression/mod.rs
//! Decompression for tarball packages
//!
//! Tar packages arrive plain, gzip-compressed (`.tar.gz`, `.tgz`) or
//! bzip2-compressed (`.tar.bz2`, `.tbz2`). This module sniffs the format from
//! magic bytes and wraps a reader in the matching streaming decoder.

use std::io::Read;

/// Supported compression formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// No compression (raw data)
    None,
    /// Gzip compression (.gz, .tgz)
    Gzip,
    /// Bzip2 compression (.bz2, .tbz2)
    Bzip2,
}

impl CompressionFormat {
    /// Detect compression format from magic bytes
    ///
    /// Magic bytes:
    /// - Gzip: `1f 8b`
    /// - Bzip2: `42 5a 68` ("BZh")
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else if data.starts_with(b"BZh") {
            Self::Bzip2
        } else {
            Self::None
        }
    }

    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
        }
    }
}

impl std::fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Create a decompressing reader for the given format
///
/// For `CompressionFormat::None`, returns the reader unchanged.
pub fn create_decoder<'a, R: Read + 'a>(reader: R, format: CompressionFormat) -> Box<dyn Read + 'a> {
    match format {
        CompressionFormat::None => Box::new(reader),
        CompressionFormat::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
        CompressionFormat::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            CompressionFormat::from_magic_bytes(&[0x1f, 0x8b, 0x08, 0x00]),
            CompressionFormat::Gzip
        );
        assert_eq!(CompressionFormat::from_magic_bytes(b"BZh91AY"), CompressionFormat::Bzip2);
        assert_eq!(CompressionFormat::from_magic_bytes(&[0x1f]), CompressionFormat::None);
    }

    #[test]
    fn test_gzip_decoder() {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"hello").unwrap();
        let compressed = encoder.finish().unwrap();
        assert_eq!(CompressionFormat::from_magic_bytes(&compressed), CompressionFormat::Gzip);

        let mut output = String::new();
        create_decoder(compressed.as_slice(), CompressionFormat::Gzip)
            .read_to_string(&mut output)
            .unwrap();
        assert_eq!(output, "hello");
    }

    #[test]
    fn test_bzip2_decoder() {
        let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
        encoder.write_all(b"hello").unwrap();
        let compressed = encoder.finish().unwrap();
        assert_eq!(CompressionFormat::from_magic_bytes(&compressed), CompressionFormat::Bzip2);

        let mut output = String::new();
        create_decoder(compressed.as_slice(), CompressionFormat::Bzip2)
            .read_to_string(&mut output)
            .unwrap();
        assert_eq!(output, "hello");
    }
}
