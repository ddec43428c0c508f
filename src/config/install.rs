use crate::config::toml_config::TomlConfig;
use crate::utils::error::{InstallError, Result};
use crate::utils::validation::{self, Validate};
use std::path::{Path, PathBuf};

pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/Frix-x/klippain-shaketune.git";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_TARGET_SERVICE: &str = "klipper.service";
pub const UPDATER_SECTION_NAME: &str = "Klippain-ShakeTune";
pub const LEGACY_MACRO_DIR: &str = "K-ShakeTune";
pub const MODULE_DIR_NAME: &str = "shaketune";

pub const DEFAULT_SYSTEM_PACKAGES: &[&str] = &[
    "python3-venv",
    "python3-numpy",
    "python3-scipy",
    "python3-matplotlib",
    "libopenblas-dev",
];

/// Provided by the distribution packages and linked into the venv instead of
/// being built by pip.
pub const DEFAULT_EXCLUDED_PYTHON_PACKAGES: &[&str] = &["numpy", "scipy", "matplotlib"];

pub const DEFAULT_RESTART_SERVICES: &[&str] = &["klipper", "moonraker"];

/// Every filesystem location the installer touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    pub home: PathBuf,
    pub user_config_dir: PathBuf,
    /// `~/klippain_config`, present when the full Klippain config is installed.
    pub klippain_config: PathBuf,
    pub moonraker_config: PathBuf,
    pub klipper_dir: PathBuf,
    pub extras_dir: PathBuf,
    pub extras_link: PathBuf,
    pub venv: PathBuf,
    pub repository: PathBuf,
    pub module_source: PathBuf,
    pub requirements: PathBuf,
}

impl InstallPaths {
    pub fn from_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let user_config_dir = home.join("printer_data").join("config");
        let klipper_dir = home.join("klipper");
        let extras_dir = klipper_dir.join("klippy").join("extras");
        let repository = home.join("klippain_shaketune");

        Self {
            moonraker_config: user_config_dir.join("moonraker.conf"),
            klippain_config: home.join("klippain_config"),
            extras_link: extras_dir.join(MODULE_DIR_NAME),
            extras_dir,
            klipper_dir,
            venv: home.join("klippy-env"),
            module_source: repository.join(MODULE_DIR_NAME),
            requirements: repository.join("requirements.txt"),
            repository,
            user_config_dir,
            home,
        }
    }

    pub fn with_klipper_dir(mut self, klipper_dir: PathBuf) -> Self {
        self.extras_dir = klipper_dir.join("klippy").join("extras");
        self.extras_link = self.extras_dir.join(MODULE_DIR_NAME);
        self.klipper_dir = klipper_dir;
        self
    }

    pub fn with_repository(mut self, repository: PathBuf) -> Self {
        self.module_source = repository.join(MODULE_DIR_NAME);
        self.requirements = repository.join("requirements.txt");
        self.repository = repository;
        self
    }

    /// Whether the full Klippain config owns the user config directory.
    pub fn is_klippain_layout(&self) -> bool {
        self.klippain_config.is_dir() && self.user_config_dir.join(".VERSION").is_file()
    }

    /// The two legacy macro folder locations; only one applies. Klippain
    /// kept the macros under `scripts/`.
    pub fn legacy_macro_dir(&self) -> PathBuf {
        if self.is_klippain_layout() {
            self.user_config_dir.join("scripts").join(LEGACY_MACRO_DIR)
        } else {
            self.user_config_dir.join(LEGACY_MACRO_DIR)
        }
    }

    /// Renders a path with `~` when it lives under the home directory.
    pub fn display_with_tilde(&self, path: &Path) -> String {
        match path.strip_prefix(&self.home) {
            Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
            Ok(rest) => format!("~/{}", rest.display()),
            Err(_) => path.display().to_string(),
        }
    }
}

/// Expands a leading `~` against `home`.
pub fn expand_home(home: &Path, raw: &str) -> PathBuf {
    if raw == "~" {
        home.to_path_buf()
    } else if let Some(rest) = raw.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(raw)
    }
}

/// Fully resolved installer settings.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub paths: InstallPaths,
    pub repository_url: String,
    pub branch: String,
    pub system_packages: Vec<String>,
    pub excluded_python_packages: Vec<String>,
    pub target_service: String,
    pub restart_services: Vec<String>,
    pub skip_restart: bool,
}

impl InstallConfig {
    pub fn with_defaults(home: impl Into<PathBuf>) -> Self {
        Self {
            paths: InstallPaths::from_home(home),
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            system_packages: to_owned_list(DEFAULT_SYSTEM_PACKAGES),
            excluded_python_packages: to_owned_list(DEFAULT_EXCLUDED_PYTHON_PACKAGES),
            target_service: DEFAULT_TARGET_SERVICE.to_string(),
            restart_services: to_owned_list(DEFAULT_RESTART_SERVICES),
            skip_restart: false,
        }
    }

    /// Layers settings: built-in defaults, then the TOML file, then the
    /// venv override (`--venv` / `KLIPPER_VENV`).
    pub fn resolve(
        home: Option<PathBuf>,
        file: Option<&TomlConfig>,
        venv_override: Option<PathBuf>,
        skip_restart: bool,
    ) -> Result<Self> {
        let file_home = file
            .and_then(|f| f.paths.as_ref())
            .and_then(|p| p.home.as_ref())
            .map(PathBuf::from);
        let home = file_home.or(home);
        let home = validation::validate_required_field("paths.home", &home)?;

        let mut config = Self::with_defaults(home.clone());
        if let Some(file) = file {
            config.apply_file(file);
        }
        if let Some(venv) = venv_override {
            config.paths.venv = venv;
        }
        config.skip_restart = config.skip_restart || skip_restart;

        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: &TomlConfig) {
        let home = self.paths.home.clone();

        if let Some(paths) = &file.paths {
            if let Some(klipper) = &paths.klipper {
                self.paths = self.paths.clone().with_klipper_dir(expand_home(&home, klipper));
            }
            if let Some(repository) = &paths.repository {
                self.paths = self.paths.clone().with_repository(expand_home(&home, repository));
            }
            if let Some(venv) = &paths.venv {
                self.paths.venv = expand_home(&home, venv);
            }
            if let Some(moonraker_config) = &paths.moonraker_config {
                self.paths.moonraker_config = expand_home(&home, moonraker_config);
            }
        }

        if let Some(repository) = &file.repository {
            if let Some(url) = &repository.url {
                self.repository_url = url.clone();
            }
            if let Some(branch) = &repository.branch {
                self.branch = branch.clone();
            }
        }

        if let Some(packages) = &file.packages {
            if let Some(system) = &packages.system {
                self.system_packages = system.clone();
            }
            if let Some(excluded) = &packages.excluded_python {
                self.excluded_python_packages = excluded.clone();
            }
        }

        if let Some(services) = &file.services {
            if let Some(target) = &services.target {
                self.target_service = target.clone();
            }
            if let Some(restart) = &services.restart {
                self.restart_services = restart.clone();
            }
            if let Some(skip) = services.skip_restart {
                self.skip_restart = skip;
            }
        }
    }
}

impl Validate for InstallConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_absolute_path("paths.home", &self.paths.home)?;
        validation::validate_absolute_path("paths.venv", &self.paths.venv)?;
        validation::validate_absolute_path("paths.klipper", &self.paths.klipper_dir)?;
        validation::validate_absolute_path("paths.repository", &self.paths.repository)?;
        validation::validate_absolute_path("paths.moonraker_config", &self.paths.moonraker_config)?;

        if self.paths.repository.parent().is_none() || self.paths.repository.file_name().is_none() {
            return Err(InstallError::InvalidConfigValueError {
                field: "paths.repository".to_string(),
                value: self.paths.repository.display().to_string(),
                reason: "Repository path needs a parent directory and a name".to_string(),
            });
        }

        validation::validate_git_url("repository.url", &self.repository_url)?;
        validation::validate_non_empty_string("repository.branch", &self.branch)?;
        validation::validate_package_names("packages.system", &self.system_packages)?;
        validation::validate_python_package_names(
            "packages.excluded_python",
            &self.excluded_python_packages,
        )?;
        validation::validate_unit_names("services.target", std::slice::from_ref(&self.target_service))?;
        validation::validate_unit_names("services.restart", &self.restart_services)?;

        Ok(())
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
