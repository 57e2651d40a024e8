use thiserror::Error;
use vdif_types::VdifError;

pub type AnalyzerResult<T> = std::result::Result<T, AnalyzerError>;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Ошибка формата или обработки VDIF
    #[error("VDIF error: {0}")]
    Vdif(#[from] VdifError),

    /// Ошибка чтения/записи файла
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Некорректные аргументы или параметры конфигурации
    #[error("Config error: {0}")]
    Config(String),

    /// Сигнал, который нельзя синтезировать или коррелировать
    #[error("Signal error: {0}")]
    Signal(String),
}

impl AnalyzerError {
    pub fn config<S: Into<String>>(s: S) -> Self {
        Self::Config(s.into())
    }

    pub fn signal<S: Into<String>>(s: S) -> Self {
        Self::Signal(s.into())
    }
}
