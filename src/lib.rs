//! BGX Ripper
//!
//! Locates a BGX220S BLE module by address, connects, and reads every
//! readable characteristic of its vendor services.

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
