pub mod batch;
pub mod config;
pub mod detectors;
pub mod error;
pub mod harmonics;
pub mod io;
pub mod pipeline;
pub mod plot;
pub mod preprocess;
pub mod signal;
pub mod spectrum;

pub use detectors::*;
pub use error::{Error, Result};
pub use harmonics::*;
pub use signal::*;
