use byteorder::{ByteOrder, LittleEndian};

/// Маска из `width` младших бит.
pub fn field_mask(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

/// Читает 32-битное слово заголовка (little-endian) и сдвигает смещение.
pub fn read_word_le(
    buf: &[u8],
    off: &mut usize,
) -> u32 {
    let v = LittleEndian::read_u32(&buf[*off..*off + 4]);
    *off += 4;
    v
}

/// Битовое поле шириной `width` начиная с бита `shift`.
pub fn bit_field(
    word: u32,
    shift: u32,
    width: u32,
) -> u32 {
    (word >> shift) & field_mask(width)
}

/// 8-битные offset-binary байты в знаковые выборки.
pub fn read_offset_binary_u8(payload: &[u8]) -> Vec<i8> {
    payload.iter().map(|&b| (b as i16 - 128) as i8).collect()
}

/// 16-битные offset-binary слова (little-endian) в знаковые выборки.
///
/// Нечётный хвостовой байт игнорируется.
pub fn read_offset_binary_u16(payload: &[u8]) -> Vec<i16> {
    payload
        .chunks_exact(2)
        .map(|c| (LittleEndian::read_u16(c) as i32 - 32_768) as i16)
        .collect()
}
