//! Библиотека формата VDIF
//!
//! Кодек кадров VDIF (VLBI Data Interchange Format), читатель с
//! произвольным доступом, потоковый писатель и операции над записью:
//! вывод свойств, извлечение окна по времени и аудит целостности.
//!
//! # Быстрый старт
//!
//! ```no_run
//! use vdif_core::{audit, extract_window, infer_properties, VdifReader};
//!
//! let mut reader = VdifReader::open("recording.vdif")?;
//! let props = infer_properties(&mut reader)?;
//!
//! let report = audit(&mut reader)?;
//! assert!(report.is_simple);
//!
//! let start = props.start_seconds_from_epoch as f64;
//! let (header, window) = extract_window(&mut reader, &props, start, start + 1.0)?;
//! println!("{} samples from frame #{}", window.len(), header.frame_number);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audit;
pub mod binary;
pub mod epoch;
pub mod extract;
pub mod format;
pub mod properties;
pub mod serialization;

pub use audit::*;
pub use epoch::*;
pub use extract::*;
pub use format::*;
pub use properties::*;
pub use serialization::*;
pub use vdif_types;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
