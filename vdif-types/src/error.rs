use thiserror::Error;

/// Результат для операций VDIF
pub type VdifResult<T> = std::result::Result<T, VdifError>;

/// Типы ошибок чтения, записи и обработки VDIF.
#[derive(Debug, Error)]
pub enum VdifError {
    /// Байт меньше, чем требует заголовок кадра
    #[error("Truncated header at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedHeader {
        offset: u64,
        needed: usize,
        available: u64,
    },

    /// Структурно некорректный заголовок (frame_length и т.п.)
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// Разрядность, которую кодек не поддерживает (только 8 и 16)
    #[error("Unsupported bits per sample: {0}")]
    UnsupportedBitsPerSample(u8),

    /// Параметры вызова, которые кодек или движок не может выполнить
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Размер файла не кратен длине кадра
    #[error("Misaligned file: size {file_size} is not a multiple of frame length {frame_length}")]
    MisalignedFile { file_size: u64, frame_length: u32 },

    /// Запрошенное окно вне покрытия файла
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VdifError {
    /// Удобные конструкторы
    pub fn malformed<S: Into<String>>(s: S) -> Self {
        Self::MalformedHeader(s.into())
    }

    pub fn invalid_parameter<S: Into<String>>(s: S) -> Self {
        Self::InvalidParameter(s.into())
    }

    pub fn out_of_range<S: Into<String>>(s: S) -> Self {
        Self::OutOfRange(s.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = VdifError::MisalignedFile {
            file_size: 1_001,
            frame_length: 1_000,
        };
        assert!(e.to_string().contains("1001"));
        assert!(e.to_string().contains("Misaligned"));

        let e = VdifError::TruncatedHeader {
            offset: 64,
            needed: 16,
            available: 3,
        };
        assert!(e.to_string().contains("offset 64"));

        assert!(VdifError::out_of_range("start > end")
            .to_string()
            .starts_with("Out of range"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let e: VdifError = io.into();
        assert!(matches!(e, VdifError::Io(_)));
    }
}
