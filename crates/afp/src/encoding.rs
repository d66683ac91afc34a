//! EBCDIC (code page 500) conversion for names and text

/// EBCDIC space, used to pad names
pub const EBCDIC_SPACE: u8 = 0x40;

/// EBCDIC `?`, substituted for unmappable characters
pub const EBCDIC_SUB: u8 = 0x6F;

/// Code page 500 values for ASCII 0x20..=0x7E
#[rustfmt::skip]
const ASCII_TO_CP500: [u8; 95] = [
    // SP    !     "     #     $     %     &     '
    0x40, 0x4F, 0x7F, 0x7B, 0x5B, 0x6C, 0x50, 0x7D,
    // (     )     *     +     ,     -     .     /
    0x4D, 0x5D, 0x5C, 0x4E, 0x6B, 0x60, 0x4B, 0x61,
    // 0-9
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9,
    // :     ;     <     =     >     ?     @
    0x7A, 0x5E, 0x4C, 0x7E, 0x6E, 0x6F, 0x7C,
    // A-I
    0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9,
    // J-R
    0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9,
    // S-Z
    0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9,
    // [     \     ]     ^     _     `
    0x4A, 0xE0, 0x5A, 0x5F, 0x6D, 0x79,
    // a-i
    0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    // j-r
    0x91, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99,
    // s-z
    0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9,
    // {     |     }     ~
    0xC0, 0xBB, 0xD0, 0xA1,
];

/// Encode a single character
pub fn ebcdic_encode_char(c: char) -> u8 {
    match c {
        ' '..='~' => ASCII_TO_CP500[c as usize - 0x20],
        '\u{A0}' => EBCDIC_SPACE,
        _ => EBCDIC_SUB,
    }
}

/// Encode a string, replacing characters outside printable ASCII with `?`
pub fn ebcdic_encode(text: &str) -> Vec<u8> {
    text.chars().map(ebcdic_encode_char).collect()
}

/// Decode a single byte, returning `None` for bytes outside the printable set
pub fn ebcdic_decode_byte(byte: u8) -> Option<char> {
    ASCII_TO_CP500
        .iter()
        .position(|b| *b == byte)
        .map(|index| (index as u8 + 0x20) as char)
}

/// Decode a byte string for display, unknown bytes become `.`
pub fn ebcdic_decode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| ebcdic_decode_byte(*b).unwrap_or('.'))
        .collect()
}

/// Encode `text` into a fixed-width, space padded (or truncated) name
pub fn ebcdic_fixed<const N: usize>(text: &str) -> [u8; N] {
    let mut out = [EBCDIC_SPACE; N];
    for (slot, c) in out.iter_mut().zip(text.chars()) {
        *slot = ebcdic_encode_char(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_name() {
        assert_eq!(
            ebcdic_encode("PGN00001"),
            vec![0xD7, 0xC7, 0xD5, 0xF0, 0xF0, 0xF0, 0xF0, 0xF1]
        );
        assert_eq!(ebcdic_fixed::<4>("AB"), [0xC1, 0xC2, 0x40, 0x40]);
        assert_eq!(ebcdic_fixed::<2>("ABC"), [0xC1, 0xC2]);
    }

    #[test]
    fn test_decode() {
        assert_eq!(ebcdic_decode(&ebcdic_encode("Hello, World!")), "Hello, World!");
        assert_eq!(ebcdic_decode(&[0x00, 0xC1]), ".A");
        assert_eq!(ebcdic_encode_char('ä'), EBCDIC_SUB);
    }
}
