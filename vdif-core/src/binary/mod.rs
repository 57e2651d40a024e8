//! Низкоуровневые помощники: слова заголовка и offset-binary выборки.

pub mod read;
pub mod write;

pub use read::*;
pub use write::*;
