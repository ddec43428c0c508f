pub mod install;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "shaketune-installer")]
#[command(about = "Install or update the Klippain Shake&Tune module for Klipper")]
pub struct CliConfig {
    /// Optional TOML file overriding paths, packages and services
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Klipper virtual environment location
    #[arg(long, env = "KLIPPER_VENV")]
    pub venv: Option<PathBuf>,

    /// Leave the Klipper and Moonraker services running as they are
    #[arg(long)]
    pub skip_restart: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the optional settings file and merges everything into an
    /// [`install::InstallConfig`].
    pub fn into_install_config(self) -> crate::Result<install::InstallConfig> {
        let file = match &self.config {
            Some(path) => Some(toml_config::TomlConfig::from_file(path)?),
            None => None,
        };

        install::InstallConfig::resolve(dirs::home_dir(), file.as_ref(), self.venv, self.skip_restart)
    }
}
