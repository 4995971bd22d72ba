//! The binary container around a generated grammar.
//!
//! An artifact is a [`HEADER_LEN`]-byte [`ArtifactHeader`] followed by the
//! payload, a UTF-8 tree-sitter `grammar.json`. Decoding checks the header in
//! a fixed order (magic, ABI range, flags, length, checksum) and borrows the
//! payload without copying it.

mod header;

pub use header::{ArtifactHeader, ABI_VERSION, HEADER_LEN, MAGIC, MIN_COMPATIBLE_ABI_VERSION};

use thiserror::Error;

/// Reasons an artifact can be rejected before its payload is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    /// The artifact contained no bytes at all.
    #[error("artifact is empty")]
    Empty,

    /// Fewer bytes than a full header.
    #[error("artifact is truncated: {len} bytes, header needs {need}", need = HEADER_LEN)]
    Truncated {
        /// Number of bytes actually present.
        len: usize,
    },

    /// The leading marker is not [`MAGIC`].
    #[error("bad magic {found:?}, expected {expected:?}", expected = MAGIC)]
    BadMagic {
        /// The four bytes found at the start of the artifact.
        found: [u8; 4],
    },

    /// The artifact was generated for an ABI this crate cannot load.
    #[error(
        "incompatible ABI version {found}, supported range is {min}..={max}",
        min = MIN_COMPATIBLE_ABI_VERSION,
        max = ABI_VERSION
    )]
    IncompatibleAbi {
        /// The ABI version recorded in the header.
        found: u16,
    },

    /// Reserved header bits were set.
    #[error("unsupported artifact flags {0:#06x}")]
    UnsupportedFlags(u16),

    /// The declared payload length disagrees with the bytes present.
    #[error("payload length mismatch: header declares {declared} bytes, found {actual}")]
    LengthMismatch {
        /// Length recorded in the header.
        declared: u32,
        /// Bytes following the header.
        actual: usize,
    },

    /// The payload does not hash to the recorded checksum.
    #[error("checksum mismatch: header records {expected:#010x}, payload hashes to {actual:#010x}")]
    ChecksumMismatch {
        /// Checksum recorded in the header.
        expected: u32,
        /// Checksum of the payload as read.
        actual: u32,
    },

    /// The payload exceeds the 32-bit length field.
    #[error("payload of {0} bytes is too large for an artifact")]
    TooLarge(usize),
}

/// A decoded artifact borrowing its payload from the input bytes.
#[derive(Debug, Clone, Copy)]
pub struct Artifact<'a> {
    /// The validated header.
    pub header: ArtifactHeader,
    /// The payload bytes (a `grammar.json` document).
    pub payload: &'a [u8],
}

/// Wraps `payload` in an artifact stamped with the current [`ABI_VERSION`].
///
/// # Errors
///
/// Returns [`ArtifactError::TooLarge`] if the payload exceeds `u32::MAX` bytes.
pub fn encode(payload: &[u8]) -> Result<Vec<u8>, ArtifactError> {
    encode_with_abi(payload, ABI_VERSION)
}

/// Wraps `payload` in an artifact stamped with an explicit ABI version.
///
/// # Errors
///
/// Returns [`ArtifactError::TooLarge`] if the payload exceeds `u32::MAX` bytes.
pub fn encode_with_abi(payload: &[u8], abi_version: u16) -> Result<Vec<u8>, ArtifactError> {
    let header = ArtifactHeader::for_payload(payload, abi_version)
        .ok_or(ArtifactError::TooLarge(payload.len()))?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(payload);
    Ok(bytes)
}

/// Decodes and verifies an artifact.
///
/// # Errors
///
/// Returns the first [`ArtifactError`] found, checking emptiness, truncation,
/// magic, ABI range, flags, payload length and checksum in that order.
pub fn decode(bytes: &[u8]) -> Result<Artifact<'_>, ArtifactError> {
    if bytes.is_empty() {
        return Err(ArtifactError::Empty);
    }
    let Some((head, payload)) = bytes.split_first_chunk::<HEADER_LEN>() else {
        return Err(ArtifactError::Truncated { len: bytes.len() });
    };

    let header = ArtifactHeader::from_bytes(head);
    if header.magic != MAGIC {
        return Err(ArtifactError::BadMagic {
            found: header.magic,
        });
    }
    if !(MIN_COMPATIBLE_ABI_VERSION..=ABI_VERSION).contains(&header.abi_version) {
        return Err(ArtifactError::IncompatibleAbi {
            found: header.abi_version,
        });
    }
    if header.flags != 0 {
        return Err(ArtifactError::UnsupportedFlags(header.flags));
    }
    if usize::try_from(header.payload_len).ok() != Some(payload.len()) {
        return Err(ArtifactError::LengthMismatch {
            declared: header.payload_len,
            actual: payload.len(),
        });
    }
    let actual = crc32fast::hash(payload);
    if actual != header.checksum {
        return Err(ArtifactError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }

    Ok(Artifact { header, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = br#"{"name":"tiny","rules":{"source_file":{"type":"BLANK"}}}"#;

    #[test]
    fn test_decode_returns_payload() {
        let bytes = encode(PAYLOAD).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + PAYLOAD.len());

        let artifact = decode(&bytes).unwrap();
        assert_eq!(artifact.payload, PAYLOAD);
        assert_eq!(artifact.header.abi_version, ABI_VERSION);
    }

    #[test]
    fn test_empty_and_truncated() {
        assert_eq!(decode(&[]).unwrap_err(), ArtifactError::Empty);
        assert_eq!(
            decode(b"TSGA\x0f\x00").unwrap_err(),
            ArtifactError::Truncated { len: 6 }
        );
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(PAYLOAD).unwrap();
        bytes[0..4].copy_from_slice(b"\x7fELF");
        assert_eq!(
            decode(&bytes).unwrap_err(),
            ArtifactError::BadMagic { found: *b"\x7fELF" }
        );
    }

    #[test]
    fn test_abi_window() {
        let oldest = encode_with_abi(PAYLOAD, MIN_COMPATIBLE_ABI_VERSION).unwrap();
        assert!(decode(&oldest).is_ok());

        let too_old = encode_with_abi(PAYLOAD, MIN_COMPATIBLE_ABI_VERSION - 1).unwrap();
        assert_eq!(
            decode(&too_old).unwrap_err(),
            ArtifactError::IncompatibleAbi { found: 12 }
        );

        let too_new = encode_with_abi(PAYLOAD, ABI_VERSION + 1).unwrap();
        assert!(matches!(
            decode(&too_new),
            Err(ArtifactError::IncompatibleAbi { found: 16 })
        ));
    }

    #[test]
    fn test_reserved_flags_rejected() {
        let mut bytes = encode(PAYLOAD).unwrap();
        bytes[6] = 0x01;
        assert_eq!(
            decode(&bytes).unwrap_err(),
            ArtifactError::UnsupportedFlags(1)
        );
    }

    #[test]
    fn test_length_mismatch() {
        let mut bytes = encode(PAYLOAD).unwrap();
        bytes.pop();
        assert!(matches!(
            decode(&bytes),
            Err(ArtifactError::LengthMismatch { actual, .. }) if actual == PAYLOAD.len() - 1
        ));
    }

    #[test]
    fn test_corrupted_payload() {
        let mut bytes = encode(PAYLOAD).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        assert!(matches!(
            decode(&bytes),
            Err(ArtifactError::ChecksumMismatch { .. })
        ));
    }
}
