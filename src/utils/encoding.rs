// Encoding utilities

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};

/// Text encoding types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Iso8859_1 = 0,
    Utf16 = 1,
    Utf16BE = 2,
    Utf8 = 3,
}

impl TextEncoding {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => TextEncoding::Iso8859_1,
            1 => TextEncoding::Utf16,
            2 => TextEncoding::Utf16BE,
            3 => TextEncoding::Utf8,
            _ => TextEncoding::Iso8859_1,
        }
    }

    /// Strings in UTF-16 encodings end with two zero bytes
    pub fn is_double_byte(&self) -> bool {
        matches!(self, TextEncoding::Utf16 | TextEncoding::Utf16BE)
    }
}

/// Decode text with specified encoding.
///
/// Byte sequences that are invalid for the encoding decode to an empty string.
pub fn decode_text(data: &[u8], encoding: TextEncoding) -> String {
    match encoding {
        TextEncoding::Iso8859_1 => decode_strict(WINDOWS_1252, data),
        TextEncoding::Utf16 => {
            // Detect BOM
            if data.len() < 2 {
                return String::new();
            }
            match &data[0..2] {
                [0xFF, 0xFE] => decode_strict(UTF_16LE, &data[2..]),
                [0xFE, 0xFF] => decode_strict(UTF_16BE, &data[2..]),
                _ => decode_strict(UTF_16LE, data),
            }
        }
        TextEncoding::Utf16BE => decode_strict(UTF_16BE, data),
        TextEncoding::Utf8 => decode_strict(UTF_8, data),
    }
}

fn decode_strict(encoding: &'static Encoding, data: &[u8]) -> String {
    encoding
        .decode_without_bom_handling_and_without_replacement(data)
        .map(|text| text.into_owned())
        .unwrap_or_default()
}

/// Slice out a zero-terminated run starting at `cursor`, reading at most
/// `max_len` bytes.
///
/// With `double` set the run ends at the first pair of consecutive zero bytes,
/// whether or not the pair sits on a 16-bit boundary. The cursor moves one past
/// the terminator, or to the bound when no terminator was found.
pub fn read_terminated<'a>(data: &'a [u8], cursor: &mut usize, max_len: usize, double: bool) -> &'a [u8] {
    if *cursor >= data.len() {
        return &[];
    }

    let start = *cursor;
    let bound = start.saturating_add(max_len).min(data.len());
    let window = &data[start..bound];

    let terminator = if double {
        window.windows(2).position(|pair| pair == [0, 0]).map(|i| (i, i + 2))
    } else {
        window.iter().position(|&b| b == 0).map(|i| (i, i + 1))
    };

    match terminator {
        Some((end, consumed)) => {
            *cursor = start + consumed;
            &window[..end]
        }
        None => {
            *cursor = bound;
            window
        }
    }
}

/// Read a terminated string, using the terminator rule of `encoding`
pub fn read_string(data: &[u8], cursor: &mut usize, max_len: usize, encoding: TextEncoding) -> String {
    let double = encoding.is_double_byte();
    let start = *cursor;
    let bytes = read_terminated(data, cursor, max_len, double);

    if double && bytes.len() % 2 == 1 {
        let terminated = *cursor - start > bytes.len();
        if !terminated {
            // Cut off at the bound: the dangling byte is half a code unit
            return decode_text(&bytes[..bytes.len() - 1], encoding);
        }
        // The first zero of the detected pair was the high byte of the last code unit
        let mut aligned = bytes.to_vec();
        aligned.push(0);
        return decode_text(&aligned, encoding);
    }

    decode_text(bytes, encoding)
}

/// Read a string with single-zero termination, regardless of any declared encoding
pub fn read_latin1_string(data: &[u8], cursor: &mut usize, max_len: usize) -> String {
    read_string(data, cursor, max_len, TextEncoding::Iso8859_1)
}
