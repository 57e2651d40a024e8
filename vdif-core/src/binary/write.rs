use byteorder::{ByteOrder, LittleEndian};

use crate::binary::field_mask;

/// Пишет 32-битное слово заголовка (little-endian) и сдвигает смещение.
pub fn write_word_le(
    buf: &mut [u8],
    off: &mut usize,
    val: u32,
) {
    LittleEndian::write_u32(&mut buf[*off..*off + 4], val);
    *off += 4;
}

/// Помещает `value` в битовое поле; лишние старшие биты отбрасываются.
pub fn put_bit_field(
    word: u32,
    shift: u32,
    width: u32,
    value: u32,
) -> u32 {
    let mask = field_mask(width);
    (word & !(mask << shift)) | ((value & mask) << shift)
}

/// Знаковые 8-битные выборки в offset-binary байты.
pub fn write_offset_binary_i8(
    buf: &mut Vec<u8>,
    samples: &[i8],
) {
    buf.extend(samples.iter().map(|&s| (s as i16 + 128) as u8));
}

/// Знаковые 16-битные выборки в offset-binary слова (little-endian).
pub fn write_offset_binary_i16(
    buf: &mut Vec<u8>,
    samples: &[i16],
) {
    let start = buf.len();
    buf.resize(start + samples.len() * 2, 0);
    for (chunk, &s) in buf[start..].chunks_exact_mut(2).zip(samples) {
        LittleEndian::write_u16(chunk, (s as i32 + 32_768) as u16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{bit_field, read_offset_binary_u16, read_offset_binary_u8};

    #[test]
    fn test_write_word_le() {
        let mut buf = [0u8; 8];
        let mut off = 4;
        write_word_le(&mut buf, &mut off, 0xDEAD_BEEF);
        assert_eq!(buf[4..], [0xEF, 0xBE, 0xAD, 0xDE]);
        assert_eq!(off, 8);
    }

    #[test]
    fn test_put_bit_field_keeps_neighbours() {
        let w = put_bit_field(u32::MAX, 16, 10, 0);
        assert_eq!(bit_field(w, 16, 10), 0);
        assert_eq!(bit_field(w, 0, 16), 0xFFFF);
        assert_eq!(bit_field(w, 26, 6), 0x3F);

        let w = put_bit_field(0, 0, 24, 0x0FFF_FFFF);
        assert_eq!(w, 0x00FF_FFFF);
    }

    #[test]
    fn test_offset_binary_extremes() {
        let mut buf = Vec::new();
        write_offset_binary_i8(&mut buf, &[-128, -1, 0, 127]);
        assert_eq!(buf, vec![0, 127, 128, 255]);
        assert_eq!(read_offset_binary_u8(&buf), vec![-128, -1, 0, 127]);

        let mut buf = Vec::new();
        write_offset_binary_i16(&mut buf, &[i16::MIN, 0, i16::MAX]);
        assert_eq!(buf, vec![0x00, 0x00, 0x00, 0x80, 0xFF, 0xFF]);
        assert_eq!(read_offset_binary_u16(&buf), vec![i16::MIN, 0, i16::MAX]);
    }
}
