pub mod config;
pub mod correlate;
pub mod error;
pub mod synth;

pub use config::*;
pub use correlate::*;
pub use error::*;
pub use synth::*;
