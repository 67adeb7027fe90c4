//! CLI command implementations.

pub mod common;
pub mod config;
pub mod terrain;
pub mod tile;
pub mod view;
