pub mod audit;
pub mod error;
pub mod header;
pub mod properties;
pub mod samples;
pub mod window;

pub use audit::*;
pub use error::*;
pub use header::*;
pub use properties::*;
pub use samples::*;
pub use window::*;
