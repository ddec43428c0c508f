use crate::core::requirements::{filter_requirements, requirement_name};
use crate::core::sequence::InstallContext;
use crate::domain::model::{CommandSpec, StepOutcome};
use crate::domain::ports::{Host, InstallStep};
use crate::utils::error::{InstallError, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const PTH_FILE_NAME: &str = "system_site_packages.pth";

const SYSTEM_SITE_SCRIPT: &str = "import site; print('\\n'.join(site.getsitepackages()))";
const VENV_SITE_SCRIPT: &str = "import sysconfig; print(sysconfig.get_paths()['purelib'])";

/// Makes the distribution's scientific packages visible inside the Klipper
/// venv and installs the module's remaining Python dependencies.
pub struct VirtualenvStep;

/// Picks the system package directory out of `site.getsitepackages()`:
/// the first existing one that holds `probe_package`, else the first existing
/// `dist-packages`, else the first existing entry.
pub fn select_system_site_dir(candidates: &str, probe_package: Option<&str>) -> Option<PathBuf> {
    let existing: Vec<PathBuf> = candidates
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .filter(|path| path.is_dir())
        .collect();

    if let Some(package) = probe_package {
        if let Some(dir) = existing.iter().find(|dir| dir.join(package).is_dir()) {
            return Some(dir.clone());
        }
    }

    existing
        .iter()
        .find(|dir| dir.file_name().is_some_and(|name| name == "dist-packages"))
        .or_else(|| existing.first())
        .cloned()
}

/// Writes `content` to `path` unless it is already there. Returns whether
/// the file changed.
fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
    match std::fs::read_to_string(path) {
        Ok(existing) if existing == content => Ok(false),
        Ok(_) => {
            std::fs::write(path, content)?;
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            std::fs::write(path, content)?;
            Ok(true)
        }
        Err(e) => Err(e.into()),
    }
}

fn pip_command(venv_python: &Path, args: &[&str]) -> CommandSpec {
    CommandSpec::new(venv_python.display().to_string())
        .args(["-m", "pip"])
        .args(args.iter().copied())
        .streamed()
}

fn single_line_path(stdout: &str, what: &str) -> Result<PathBuf> {
    let line = stdout.lines().map(str::trim).find(|l| !l.is_empty());
    line.map(PathBuf::from).ok_or_else(|| InstallError::ConfigError {
        message: format!("Python did not report the {}", what),
    })
}

impl VirtualenvStep {
    async fn system_site_dir(&self, host: &dyn Host, probe: Option<&str>) -> Result<PathBuf> {
        let output = host
            .run_checked(&CommandSpec::new("python3").args(["-c", SYSTEM_SITE_SCRIPT]))
            .await?;

        select_system_site_dir(&output.stdout, probe).ok_or_else(|| InstallError::ConfigError {
            message: "No existing system site-packages directory reported by python3".to_string(),
        })
    }

    async fn venv_site_dir(&self, host: &dyn Host, venv_python: &Path) -> Result<PathBuf> {
        let output = host
            .run_checked(
                &CommandSpec::new(venv_python.display().to_string()).args(["-c", VENV_SITE_SCRIPT]),
            )
            .await?;

        single_line_path(&output.stdout, "venv site-packages directory")
    }
}

#[async_trait]
impl InstallStep for VirtualenvStep {
    fn get_name(&self) -> &str {
        "virtualenv"
    }

    async fn execute(&self, context: &mut InstallContext) -> Result<StepOutcome> {
        let host = context.host.clone();
        let config = context.config.clone();
        let venv = &config.paths.venv;

        if !venv.is_dir() {
            return Err(InstallError::VenvMissing { path: venv.clone() });
        }
        let venv_python = venv.join("bin").join("python");

        let excluded = &config.excluded_python_packages;
        let probe = excluded.first().map(|p| p.to_lowercase());

        let system_site = self.system_site_dir(host.as_ref(), probe.as_deref()).await?;
        let venv_site = self.venv_site_dir(host.as_ref(), &venv_python).await?;
        tracing::info!(
            "🔗 Linking system packages from {} into {}",
            system_site.display(),
            venv_site.display()
        );

        std::fs::create_dir_all(&venv_site)?;
        let pth_changed = write_if_changed(
            &venv_site.join(PTH_FILE_NAME),
            &format!("{}\n", system_site.display()),
        )?;

        host.run_checked(&pip_command(&venv_python, &["install", "--upgrade", "pip"]))
            .await?;

        let manifest = std::fs::read_to_string(&config.paths.requirements)?;
        let filtered = filter_requirements(&manifest, excluded);
        let mut requirements_file = tempfile::Builder::new()
            .prefix("shaketune-requirements-")
            .suffix(".txt")
            .tempfile()?;
        requirements_file.write_all(filtered.as_bytes())?;
        requirements_file.flush()?;

        let requirements_path = requirements_file.path().display().to_string();
        host.run_checked(&pip_command(&venv_python, &["install", "-r", requirements_path.as_str()]))
            .await?;

        if !excluded.is_empty() {
            let modules: Vec<String> = excluded.iter().map(|p| p.to_lowercase()).collect();
            host.run_checked(
                &CommandSpec::new(venv_python.display().to_string())
                    .args(["-c".to_string(), format!("import {}", modules.join(", "))]),
            )
            .await?;
            tracing::info!("🐍 {} importable from the venv", modules.join(", "));
        }

        let kept = filtered.lines().filter(|l| requirement_name(l).is_some()).count();
        context.record("system_site_packages", system_site.display().to_string());
        context.record("venv_site_packages", venv_site.display().to_string());
        context.record("pip_requirements", kept);

        if pth_changed {
            Ok(StepOutcome::Changed)
        } else {
            Ok(StepOutcome::Unchanged)
        }
    }
}
