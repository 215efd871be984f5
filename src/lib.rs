pub mod cli;
pub mod config;
pub mod engines;
pub mod error;
pub mod orchestration;
pub mod pool;
pub mod registry;
pub mod types;

pub use error::{DgaError, Result};
pub use registry::Registry;
