#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

pub mod cli;
pub mod color;
pub mod compress;
pub mod config;
pub mod coverage;
pub mod error;
pub mod group;
pub mod metadata;
pub mod plot;
pub mod process;
