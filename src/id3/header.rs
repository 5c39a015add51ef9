// ID3v2 tag header

use tracing::debug;

use crate::utils::io::be_u32_at;

/// Size of the fixed tag header preceding the tag body
pub const HEADER_SIZE: usize = 10;

const ID: [u8; 3] = [b'I', b'D', b'3'];

/// Header flag bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagFlags {
    pub raw: u8,
    pub unsynchronisation: bool,
    pub extended_header: bool,
}

impl TagFlags {
    pub fn from_byte(raw: u8) -> Self {
        TagFlags {
            raw,
            unsynchronisation: raw & 0x80 == 0x80,
            extended_header: raw & 0x40 == 0x40,
        }
    }
}

/// ID3v2 header structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagHeader {
    pub version_major: u8,
    pub version_revision: u8,
    pub flags: TagFlags,
    /// Number of tag body bytes following the 10-byte header
    pub declared_size: u32,
}

impl TagHeader {
    /// Decode a header from the first bytes of a file.
    ///
    /// Returns `None` for short input or a missing "ID3" marker.
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < HEADER_SIZE {
            debug!(len = data.len(), "too short for an ID3v2 header");
            return None;
        }

        if data[0..3] != ID {
            debug!("missing ID3 identifier");
            return None;
        }

        Some(TagHeader {
            version_major: data[3],
            version_revision: data[4],
            flags: TagFlags::from_byte(data[5]),
            declared_size: decode_synchsafe([data[6], data[7], data[8], data[9]]),
        })
    }

    /// Version string in "2.major.revision" form
    pub fn version(&self) -> String {
        format!("2.{}.{}", self.version_major, self.version_revision)
    }

    /// Length of the extended header at the start of `body`, if one is flagged.
    ///
    /// ID3v2.3 stores a plain size that excludes the size field itself,
    /// ID3v2.4 a synchsafe size covering the whole extended header.
    pub fn extended_header_len(&self, body: &[u8]) -> usize {
        if !self.flags.extended_header || body.len() < 4 {
            return 0;
        }

        let len = if self.version_major >= 4 {
            decode_synchsafe([body[0], body[1], body[2], body[3]]) as usize
        } else {
            be_u32_at(body, 0).map_or(0, |size| size as usize + 4)
        };
        len.min(body.len())
    }
}

/// Parse synchsafe integer (7 bits per byte)
pub fn decode_synchsafe(bytes: [u8; 4]) -> u32 {
    ((bytes[0] as u32 & 0x7f) << 21)
        | ((bytes[1] as u32 & 0x7f) << 14)
        | ((bytes[2] as u32 & 0x7f) << 7)
        | (bytes[3] as u32 & 0x7f)
}

/// Encode the low 28 bits of `value` as a synchsafe integer
pub fn encode_synchsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7f) as u8,
        ((value >> 14) & 0x7f) as u8,
        ((value >> 7) & 0x7f) as u8,
        (value & 0x7f) as u8,
    ]
}
