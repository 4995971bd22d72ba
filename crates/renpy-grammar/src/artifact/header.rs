//! Fixed-size header that prefixes every grammar artifact.
//!
//! This file is also compiled into `build.rs` via `#[path]`, so it must only
//! depend on `std` and `crc32fast`.

/// Marker identifying a grammar artifact.
pub const MAGIC: [u8; 4] = *b"TSGA";

/// Size of the encoded header in bytes.
pub const HEADER_LEN: usize = 16;

/// ABI version written by this crate.
pub const ABI_VERSION: u16 = 15;

/// Oldest ABI version this crate can still load.
pub const MIN_COMPATIBLE_ABI_VERSION: u16 = 13;

/// The decoded header fields of an artifact.
///
/// Layout (little-endian): magic `[0..4]`, ABI version `[4..6]`, flags `[6..8]`,
/// payload length `[8..12]`, payload CRC-32 `[12..16]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactHeader {
    /// The leading marker bytes, expected to equal [`MAGIC`].
    pub magic: [u8; 4],
    /// ABI version of the generator that produced the payload.
    pub abi_version: u16,
    /// Reserved bits, zero in every version understood by this crate.
    pub flags: u16,
    /// Number of payload bytes following the header.
    pub payload_len: u32,
    /// CRC-32 (IEEE) of the payload.
    pub checksum: u32,
}

impl ArtifactHeader {
    /// Builds the header describing `payload` at the given ABI version.
    ///
    /// Returns `None` if the payload does not fit in a 32-bit length.
    #[must_use]
    pub fn for_payload(payload: &[u8], abi_version: u16) -> Option<Self> {
        let payload_len = u32::try_from(payload.len()).ok()?;
        Some(Self {
            magic: MAGIC,
            abi_version,
            flags: 0,
            payload_len,
            checksum: crc32fast::hash(payload),
        })
    }

    /// Serializes the header into its on-disk form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..6].copy_from_slice(&self.abi_version.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.flags.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.payload_len.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    /// Reads the raw header fields. No field is checked here.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; HEADER_LEN]) -> Self {
        Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            abi_version: u16::from_le_bytes([bytes[4], bytes[5]]),
            flags: u16::from_le_bytes([bytes[6], bytes[7]]),
            payload_len: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            checksum: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        }
    }
}
