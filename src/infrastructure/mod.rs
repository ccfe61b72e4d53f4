//! Infrastructure layer
//!
//! Everything around the core pipeline: configuration, logging, reading
//! input documents and writing resources.

mod config;
pub mod fetch;
mod logging;
pub mod writer;

pub use config::{Config, ENV_PREFIX};
pub use fetch::read_input;
pub use logging::init_logging;
pub use writer::{Destination, write_resources};
