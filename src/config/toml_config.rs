use crate::utils::error::{InstallError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Optional installer settings file. Every field may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub paths: Option<PathsConfig>,
    pub repository: Option<RepositoryConfig>,
    pub packages: Option<PackagesConfig>,
    pub services: Option<ServicesConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub home: Option<String>,
    pub venv: Option<String>,
    pub klipper: Option<String>,
    pub repository: Option<String>,
    pub moonraker_config: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    pub url: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackagesConfig {
    pub system: Option<Vec<String>>,
    pub excluded_python: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServicesConfig {
    pub target: Option<String>,
    pub restart: Option<Vec<String>>,
    pub skip_restart: Option<bool>,
}

impl TomlConfig {
    /// Loads settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(InstallError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| InstallError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[paths]
home = "/home/pi"
venv = "~/klippy-env"
klipper = "~/klipper"

[repository]
url = "https://github.com/Frix-x/klippain-shaketune.git"
branch = "develop"

[packages]
system = ["python3-numpy"]
excluded_python = ["numpy"]

[services]
restart = ["klipper"]
skip_restart = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.paths.as_ref().unwrap().home.as_deref(), Some("/home/pi"));
        assert_eq!(config.repository.as_ref().unwrap().branch.as_deref(), Some("develop"));
        assert_eq!(config.packages.as_ref().unwrap().system.as_ref().unwrap().len(), 1);
        assert_eq!(config.services.as_ref().unwrap().skip_restart, Some(true));
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.paths.is_none());
        assert!(config.repository.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SHAKETUNE_TEST_BRANCH", "testing");

        let toml_content = r#"
[repository]
branch = "${SHAKETUNE_TEST_BRANCH}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.repository.unwrap().branch.as_deref(), Some("testing"));

        std::env::remove_var("SHAKETUNE_TEST_BRANCH");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let toml_content = r#"
[repository]
uri = "https://example.com/repo.git"
"#;

        let err = TomlConfig::from_toml_str(toml_content).unwrap_err();
        assert!(matches!(err, InstallError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[paths]\nrepository = \"/srv/shaketune\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.paths.unwrap().repository.as_deref(), Some("/srv/shaketune"));
    }
}
