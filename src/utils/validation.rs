use crate::utils::error::{InstallError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn debian_package_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9+.\-]+$").expect("valid package regex"))
}

fn python_package_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9._\-]*[A-Za-z0-9])?$").expect("valid package regex")
    })
}

fn unit_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9:_.@\-]+$").expect("valid unit regex"))
}

pub fn validate_path(field_name: &str, path: &Path) -> Result<()> {
    let raw = path.to_string_lossy();
    if raw.is_empty() {
        return Err(InstallError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: raw.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if raw.contains('\0') {
        return Err(InstallError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: raw.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_absolute_path(field_name: &str, path: &Path) -> Result<()> {
    validate_path(field_name, path)?;
    if !path.is_absolute() {
        return Err(InstallError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.display().to_string(),
            reason: "Path must be absolute".to_string(),
        });
    }
    Ok(())
}

fn scp_remote_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._\-]+@[A-Za-z0-9.\-]+:[^\s:][^\s]*$").expect("valid scp remote regex")
    })
}

/// Accepts https/ssh/git/file URLs, scp-like `user@host:path` and local paths.
pub fn validate_git_url(field_name: &str, url_str: &str) -> Result<()> {
    validate_non_empty_string(field_name, url_str)?;

    let invalid = |reason: String| InstallError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: url_str.to_string(),
        reason,
    };

    if url_str.chars().any(char::is_whitespace) {
        return Err(invalid("Git remote URL cannot contain whitespace".to_string()));
    }

    if url_str.contains("://") {
        let url = Url::parse(url_str).map_err(|e| invalid(format!("Invalid URL format: {}", e)))?;
        return match url.scheme() {
            "file" if url.path().len() > 1 => Ok(()),
            "file" => Err(invalid("File URL must name a repository path".to_string())),
            "http" | "https" | "ssh" | "git" => match url.host_str() {
                Some(host) if !host.is_empty() => Ok(()),
                _ => Err(invalid("URL must include a host".to_string())),
            },
            scheme => Err(invalid(format!("Unsupported URL scheme: {}", scheme))),
        };
    }

    if url_str.starts_with('/') || scp_remote_regex().is_match(url_str) {
        return Ok(());
    }

    Err(invalid("Not a recognised git remote URL".to_string()))
}

pub fn validate_package_names(field_name: &str, packages: &[String]) -> Result<()> {
    for package in packages {
        if !debian_package_regex().is_match(package) {
            return Err(InstallError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: package.clone(),
                reason: "Invalid Debian package name".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_python_package_names(field_name: &str, packages: &[String]) -> Result<()> {
    for package in packages {
        if !python_package_regex().is_match(package) {
            return Err(InstallError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: package.clone(),
                reason: "Invalid Python distribution name".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_unit_names(field_name: &str, units: &[String]) -> Result<()> {
    for unit in units {
        if !unit_name_regex().is_match(unit) {
            return Err(InstallError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: unit.clone(),
                reason: "Invalid systemd unit name".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| InstallError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(InstallError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}
