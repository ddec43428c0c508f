use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("This installer must not be run as root")]
    RunningAsRoot,

    #[error("Python 3 is not installed")]
    PythonMissing,

    #[error("Service '{service}' not found in the service manager")]
    ServiceMissing { service: String },

    #[error("Klipper virtual environment not found at {}", .path.display())]
    VenvMissing { path: PathBuf },

    #[error("Command `{program} {}` failed with exit code {}: {stderr}", .args.join(" "), .code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()))]
    CommandFailed {
        program: String,
        args: Vec<String>,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Legacy directory {} is not empty, refusing to remove it", .path.display())]
    NonEmptyLegacyDir { path: PathBuf },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<InstallError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Precondition,
    ExternalCommand,
    Filesystem,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl InstallError {
    pub fn command_failed(program: &str, args: &[String], code: Option<i32>, stderr: &str) -> Self {
        InstallError::CommandFailed {
            program: program.to_string(),
            args: args.to_vec(),
            code,
            stderr: stderr.trim().to_string(),
        }
    }

    /// Innermost error, unwrapping any `StepFailed` layers.
    pub fn root_cause(&self) -> &InstallError {
        match self {
            InstallError::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.root_cause() {
            InstallError::RunningAsRoot
            | InstallError::PythonMissing
            | InstallError::ServiceMissing { .. }
            | InstallError::VenvMissing { .. } => ErrorCategory::Precondition,
            InstallError::CommandFailed { .. } => ErrorCategory::ExternalCommand,
            InstallError::NonEmptyLegacyDir { .. } | InstallError::IoError(_) => {
                ErrorCategory::Filesystem
            }
            InstallError::ConfigError { .. }
            | InstallError::MissingConfigError { .. }
            | InstallError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            InstallError::StepFailed { source, .. } => source.category(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Precondition => ErrorSeverity::High,
            ErrorCategory::ExternalCommand => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
            ErrorCategory::Filesystem => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for this failure. Never zero.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Precondition => 1,
            ErrorCategory::ExternalCommand => 2,
            ErrorCategory::Configuration => 3,
            ErrorCategory::Filesystem => 4,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.root_cause() {
            InstallError::RunningAsRoot => {
                "Run the installer as the user that owns the Klipper installation, without sudo".to_string()
            }
            InstallError::PythonMissing => {
                "Install Python 3 (e.g. `sudo apt install python3`) and retry".to_string()
            }
            InstallError::ServiceMissing { service } => {
                format!("Install {} first, then rerun the installer", service.trim_end_matches(".service"))
            }
            InstallError::VenvMissing { .. } => {
                "Check your Klipper installation or point KLIPPER_VENV at its virtual environment".to_string()
            }
            InstallError::CommandFailed { program, .. } if program == "git" => {
                "Resolve the repository state manually (local changes or diverged history) and retry".to_string()
            }
            InstallError::CommandFailed { program, .. } => {
                format!("See the {} output above for details", program)
            }
            InstallError::NonEmptyLegacyDir { path } => {
                format!("Move your files out of {} and delete it", path.display())
            }
            InstallError::IoError(_) => "Check file permissions and free disk space".to_string(),
            InstallError::ConfigError { .. }
            | InstallError::MissingConfigError { .. }
            | InstallError::InvalidConfigValueError { .. } => {
                "Fix the installer configuration file or command-line options".to_string()
            }
            InstallError::StepFailed { source, .. } => source.recovery_suggestion(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            InstallError::StepFailed { step, source } => {
                format!("[{}] {}", step, source.user_friendly_message())
            }
            InstallError::CommandFailed { program, code, .. } => match code {
                Some(code) => format!("{} exited with status {}", program, code),
                None => format!("{} was terminated by a signal", program),
            },
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, InstallError>;
