//! Utilities shared by the Tandem packages: logging setup and clocks.

pub mod logger;
pub mod time;
