#![cfg(feature = "cli")]

use clap::Parser;
use shaketune_installer::CliConfig;
use std::path::PathBuf;
use tempfile::TempDir;

// Kept as a single test: it mutates the process environment.
#[test]
fn test_klipper_venv_env_and_flag_precedence() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("installer.toml");
    std::fs::write(&settings, "[paths]\nhome = \"/home/pi\"\n").unwrap();
    let settings = settings.display().to_string();

    std::env::set_var("KLIPPER_VENV", "/opt/klipper/venv");

    let cli = CliConfig::try_parse_from(["shaketune-installer", "--config", settings.as_str()]).unwrap();
    assert_eq!(cli.venv, Some(PathBuf::from("/opt/klipper/venv")));
    let config = cli.into_install_config().unwrap();
    assert_eq!(config.paths.venv, PathBuf::from("/opt/klipper/venv"));
    assert_eq!(config.paths.home, PathBuf::from("/home/pi"));

    let cli = CliConfig::try_parse_from([
        "shaketune-installer",
        "--config",
        settings.as_str(),
        "--venv",
        "/srv/klippy-env",
    ])
    .unwrap();
    let config = cli.into_install_config().unwrap();
    assert_eq!(config.paths.venv, PathBuf::from("/srv/klippy-env"));

    std::env::remove_var("KLIPPER_VENV");

    let config = CliConfig::try_parse_from(["shaketune-installer", "--config", settings.as_str()])
        .unwrap()
        .into_install_config()
        .unwrap();
    assert_eq!(config.paths.venv, PathBuf::from("/home/pi/klippy-env"));
}
