#![allow(dead_code)]

use async_trait::async_trait;
use shaketune_installer::core::{CommandOutput, CommandSpec, Host};
use shaketune_installer::{InstallConfig, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

pub const REQUIREMENTS: &str = "GitPython==3.1.41\nmatplotlib==3.8.2\nnumpy==1.26.2\nscipy==1.11.4\nPyWavelets==1.5.0\nzstandard==0.22.0\n";

/// A pretend Raspberry Pi home directory with Klipper, its venv and Moonraker.
pub struct Workspace {
    pub root: TempDir,
    pub home: PathBuf,
    pub system_site: PathBuf,
    pub venv_site: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let home = root.path().join("home/pi");
        let system_site = root.path().join("usr/lib/python3/dist-packages");
        let venv_site = home.join("klippy-env/lib/python3.11/site-packages");

        std::fs::create_dir_all(home.join("klipper/klippy/extras")).unwrap();
        std::fs::create_dir_all(&venv_site).unwrap();
        std::fs::create_dir_all(system_site.join("numpy")).unwrap();
        std::fs::create_dir_all(home.join("printer_data/config")).unwrap();
        std::fs::write(
            home.join("printer_data/config/moonraker.conf"),
            "[server]\nhost: 0.0.0.0\n",
        )
        .unwrap();

        Self {
            root,
            home,
            system_site,
            venv_site,
        }
    }

    pub fn config(&self) -> InstallConfig {
        InstallConfig::resolve(Some(self.home.clone()), None, None, false).unwrap()
    }

    pub fn moonraker_conf(&self) -> String {
        std::fs::read_to_string(self.home.join("printer_data/config/moonraker.conf")).unwrap()
    }

    pub fn extras_link(&self) -> PathBuf {
        self.home.join("klipper/klippy/extras/shaketune")
    }

    pub fn host(&self) -> FakeHost {
        FakeHost::new(&self.system_site, &self.venv_site)
    }
}

/// Records every command and answers the ones the installer issues the way a
/// Debian machine with Klipper would.
pub struct FakeHost {
    pub superuser: bool,
    pub programs: HashSet<String>,
    pub units: Vec<String>,
    pub installed_packages: Mutex<HashSet<String>>,
    /// Commands whose rendered form contains one of these fail with exit 1.
    pub fail_on: Vec<String>,
    pub calls: Mutex<Vec<CommandSpec>>,
    pub pip_requirements: Mutex<Vec<String>>,
    system_site: PathBuf,
    venv_site: PathBuf,
}

impl FakeHost {
    pub fn new(system_site: &Path, venv_site: &Path) -> Self {
        Self {
            superuser: false,
            programs: ["python3", "git", "systemctl"].iter().map(|s| s.to_string()).collect(),
            units: vec!["klipper.service".to_string(), "moonraker.service".to_string()],
            installed_packages: Mutex::new(
                ["python3-venv", "libopenblas-dev"].iter().map(|s| s.to_string()).collect(),
            ),
            fail_on: Vec::new(),
            calls: Mutex::new(Vec::new()),
            pip_requirements: Mutex::new(Vec::new()),
            system_site: system_site.to_path_buf(),
            venv_site: venv_site.to_path_buf(),
        }
    }

    pub fn as_root(mut self) -> Self {
        self.superuser = true;
        self
    }

    pub fn without_program(mut self, program: &str) -> Self {
        self.programs.remove(program);
        self
    }

    pub fn without_unit(mut self, unit: &str) -> Self {
        self.units.retain(|u| u != unit);
        self
    }

    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.fail_on.push(fragment.to_string());
        self
    }

    pub fn rendered_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.to_string()).collect()
    }

    pub fn count_calls(&self, fragment: &str) -> usize {
        self.rendered_calls().iter().filter(|c| c.contains(fragment)).count()
    }

    fn simulate_clone(command: &CommandSpec) {
        // git -C <parent> clone <url> <name>
        let parent = PathBuf::from(&command.args[1]);
        let name = command.args.last().unwrap();
        let repo = parent.join(name);

        std::fs::create_dir_all(repo.join("shaketune")).unwrap();
        std::fs::write(repo.join("shaketune/__init__.py"), "").unwrap();
        std::fs::write(repo.join("requirements.txt"), REQUIREMENTS).unwrap();
        std::fs::write(repo.join("install.sh"), "#!/bin/bash\n").unwrap();
    }
}

#[async_trait]
impl Host for FakeHost {
    fn is_superuser(&self) -> bool {
        self.superuser
    }

    fn find_program(&self, name: &str) -> Option<PathBuf> {
        self.programs
            .contains(name)
            .then(|| PathBuf::from("/usr/bin").join(name))
    }

    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());
        let rendered = command.to_string();

        if self.fail_on.iter().any(|f| rendered.contains(f.as_str())) {
            return Ok(CommandOutput::failure(1, format!("simulated failure: {}", rendered)));
        }

        let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
        let output = match (command.program.as_str(), args.as_slice()) {
            ("systemctl", ["list-units", ..]) => {
                let listing: String = self
                    .units
                    .iter()
                    .map(|u| format!("  {} loaded active running {}\n", u, u))
                    .collect();
                CommandOutput::success(listing)
            }
            ("dpkg", ["-s", package]) => {
                if self.installed_packages.lock().unwrap().contains(*package) {
                    CommandOutput::success(format!("Package: {}\nStatus: install ok installed\n", package))
                } else {
                    CommandOutput::failure(1, format!("dpkg-query: package '{}' is not installed", package))
                }
            }
            ("apt-get", ["install", "-y", packages @ ..]) => {
                let mut installed = self.installed_packages.lock().unwrap();
                installed.extend(packages.iter().map(|p| p.to_string()));
                CommandOutput::success("")
            }
            ("git", [_, _, "clone", ..]) => {
                Self::simulate_clone(command);
                CommandOutput::success("")
            }
            ("git", [_, _, "rev-parse", "HEAD"]) => CommandOutput::success("4f2c1ab\n"),
            ("python3", ["-c", _]) => CommandOutput::success(format!(
                "{}\n{}\n",
                self.system_site.with_file_name("missing-dist-packages").display(),
                self.system_site.display()
            )),
            (_, ["-c", script]) if script.contains("sysconfig") => {
                CommandOutput::success(format!("{}\n", self.venv_site.display()))
            }
            (_, ["-m", "pip", "install", "-r", path]) => {
                let content = std::fs::read_to_string(path).unwrap();
                self.pip_requirements.lock().unwrap().push(content);
                CommandOutput::success("")
            }
            _ => CommandOutput::success(""),
        };
        Ok(output)
    }
}
