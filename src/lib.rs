// Library surface for headless/integration tests and the binary.
pub mod analysis;
pub mod app_dirs;
pub mod collector;
pub mod config;
pub mod dataset;
pub mod error;
pub mod experiment;
pub mod recorder;
pub mod runtime;
pub mod sampler;
pub mod sequencer;
pub mod session;
pub mod trajectory;
pub mod ui;

pub use error::{Error, Result};
