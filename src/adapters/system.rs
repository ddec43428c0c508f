use crate::domain::model::{CommandOutput, CommandSpec};
use crate::domain::ports::Host;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Runs commands on the local machine, escalating through `sudo` when asked.
#[derive(Debug, Clone, Default)]
pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        Self
    }

    fn build(command: &CommandSpec) -> Command {
        let mut cmd = if command.privileged {
            let mut sudo = Command::new("sudo");
            sudo.arg(&command.program);
            sudo
        } else {
            Command::new(&command.program)
        };

        cmd.args(&command.args)
            // Tool output is parsed in a few places
            .env("LC_ALL", "C")
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

#[async_trait]
impl Host for SystemHost {
    fn is_superuser(&self) -> bool {
        unsafe { libc::geteuid() == 0 }
    }

    fn find_program(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        tracing::debug!("⚙️ Running: {}", command);

        let mut child = Self::build(command).spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (stdout, stderr, status) = tokio::try_join!(
            collect_lines(stdout, command.streamed, false),
            collect_lines(stderr, command.streamed, true),
            child.wait(),
        )?;

        if !status.success() && !command.streamed {
            for line in stderr.lines() {
                tracing::warn!("  {}", line);
            }
        }

        Ok(CommandOutput {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Reads a child pipe to the end, logging each line as it arrives.
async fn collect_lines<R>(pipe: Option<R>, streamed: bool, is_stderr: bool) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else {
        return Ok(String::new());
    };

    let mut segments = BufReader::new(pipe).split(b'\n');
    let mut captured = String::new();
    while let Some(segment) = segments.next_segment().await? {
        let line = String::from_utf8_lossy(&segment);
        let line = line.trim_end_matches('\r');
        if streamed {
            tracing::info!("  {}", line);
        } else if !is_stderr {
            tracing::debug!("  {}", line);
        }
        captured.push_str(line);
        captured.push('\n');
    }
    Ok(captured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_captures_stdout_and_exit_code() {
        let host = SystemHost::new();

        let ok = host.run(&CommandSpec::new("sh").args(["-c", "echo hello"])).await.unwrap();
        assert!(ok.is_success());
        assert_eq!(ok.stdout.trim(), "hello");

        let failed = host.run(&CommandSpec::new("sh").args(["-c", "echo oops >&2; exit 3"])).await.unwrap();
        assert_eq!(failed.code, Some(3));
        assert_eq!(failed.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_run_checked_reports_failure() {
        let host = SystemHost::new();
        let err = host
            .run_checked(&CommandSpec::new("sh").args(["-c", "exit 1"]))
            .await
            .unwrap_err();

        assert!(matches!(err, crate::utils::error::InstallError::CommandFailed { code: Some(1), .. }));
    }

    #[tokio::test]
    async fn test_streamed_run_still_captures_output() {
        let host = SystemHost::new();
        let out = host
            .run(&CommandSpec::new("sh").args(["-c", "echo one; echo two >&2; echo three"]).streamed())
            .await
            .unwrap();

        assert!(out.is_success());
        assert_eq!(out.stdout, "one\nthree\n");
        assert_eq!(out.stderr, "two\n");
    }

    #[test]
    fn test_find_program() {
        let host = SystemHost::new();
        assert!(host.find_program("sh").is_some());
        assert!(host.find_program("definitely-not-a-real-program-xyz").is_none());
    }

    #[tokio::test]
    async fn test_run_in_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let host = SystemHost::new();
        let out = host
            .run(&CommandSpec::new("pwd").in_dir(dir.path()))
            .await
            .unwrap();

        let reported = std::fs::canonicalize(out.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }
}
