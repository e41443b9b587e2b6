//! CLI command implementations.

mod attach_images;
mod chunk;
mod config;
mod doctor;
mod recover;
mod serve;

pub use attach_images::run_attach_images;
pub use chunk::run_chunk;
pub use config::run_config;
pub use doctor::run_doctor;
pub use recover::run_recover;
pub use serve::run_serve;
