//! Configuration Module
//!
//! Client settings and the loader that assembles them from files and the
//! environment.

pub mod client;
pub mod loader;

pub use client::{ClientConfig, DEFAULT_BASE_URL};
pub use loader::{ConfigLoader, FileConfig};
