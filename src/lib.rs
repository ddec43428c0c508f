pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::SystemHost;
pub use config::install::{InstallConfig, InstallPaths};
pub use crate::core::{installer::Installer, sequence::InstallSequence};
pub use utils::error::{InstallError, Result};
