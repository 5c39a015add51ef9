// I/O utilities for reading tag bytes

use std::io::{Read, Seek, SeekFrom};

/// Random-access byte reader over an audio file or buffer.
///
/// Short reads at the end of the input are not errors; callers get whatever
/// bytes exist.
pub trait ByteSource {
    fn read_bytes(&mut self, offset: u64, length: usize) -> std::io::Result<Vec<u8>>;
}

impl<R: Read + Seek> ByteSource for R {
    fn read_bytes(&mut self, offset: u64, length: usize) -> std::io::Result<Vec<u8>> {
        self.seek(SeekFrom::Start(offset))?;
        let mut buffer = Vec::new();
        self.by_ref().take(length as u64).read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

/// Read big-endian 16-bit integer at `offset`, if in range
pub fn be_u16_at(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Read big-endian 32-bit integer at `offset`, if in range
pub fn be_u32_at(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
