//! Packaging tool execution.
//!
//! Runs the content prep tool over a staged folder. The tool is reached
//! through [`PackagingTool`] so the pipeline can be exercised without it.

use crate::packager::error::{Error, Result};
use async_trait::async_trait;
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

#[cfg(test)]
use mockall::automock;

/// Inputs of one packaging tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingRequest {
    /// Staged folder to package.
    pub source_dir: PathBuf,
    /// Setup file, relative to `source_dir`.
    pub setup_file: PathBuf,
    /// Folder receiving the archive.
    pub output_dir: PathBuf,
    /// Replace an existing archive of the same name.
    pub overwrite: bool,
}

/// Turns a staged folder into a single archive.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PackagingTool: Send + Sync {
    /// Runs the tool to completion. Any failure is returned unchanged and
    /// is never retried.
    async fn package(&self, request: &PackagingRequest) -> Result<()>;
}

/// [`PackagingTool`] backed by an external executable.
#[derive(Debug, Clone)]
pub struct CommandPackagingTool {
    program: PathBuf,
    timeout: Duration,
}

impl CommandPackagingTool {
    /// Creates a tool running `program`, killed after `timeout`.
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Returns the executable path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Builds the command line for a request.
    ///
    /// `-c <source> -s <setup> -o <output>`, plus `-q` to overwrite quietly.
    pub fn args(request: &PackagingRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-c".into(),
            request.source_dir.clone().into_os_string(),
            "-s".into(),
            request.setup_file.clone().into_os_string(),
            "-o".into(),
            request.output_dir.clone().into_os_string(),
        ];
        if request.overwrite {
            args.push("-q".into());
        }
        args
    }
}

#[async_trait]
impl PackagingTool for CommandPackagingTool {
    async fn package(&self, request: &PackagingRequest) -> Result<()> {
        let command = self.program.display().to_string();
        log::info!(
            "Running {command} on {} (setup {})",
            request.source_dir.display(),
            request.setup_file.display()
        );

        let mut child = tokio::process::Command::new(&self.program)
            .args(Self::args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| Error::CommandFailed {
                command: command.clone(),
                error,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let run = async {
            let (_, stderr_text) = tokio::join!(
                async {
                    if let Some(stdout) = stdout {
                        let mut lines = BufReader::new(stdout).lines();
                        while let Ok(Some(line)) = lines.next_line().await {
                            log::debug!("[packaging tool] {line}");
                        }
                    }
                },
                async {
                    let mut text = String::new();
                    if let Some(mut stderr) = stderr {
                        let _ = stderr.read_to_string(&mut text).await;
                    }
                    text
                }
            );
            let status = child.wait().await;
            (status, stderr_text)
        };

        let (status, stderr_text) = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result,
            Err(_elapsed) => {
                return Err(Error::ToolFailed {
                    command,
                    status: format!("timeout after {}s", self.timeout.as_secs()),
                    stderr: String::new(),
                });
            }
        };

        let status = status.map_err(|error| Error::CommandFailed {
            command: command.clone(),
            error,
        })?;

        if !status.success() {
            return Err(Error::ToolFailed {
                command,
                status: status.to_string(),
                stderr: stderr_text.trim().to_string(),
            });
        }

        log::info!("✓ Packaging tool finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(overwrite: bool) -> PackagingRequest {
        PackagingRequest {
            source_dir: "/work/source".into(),
            setup_file: "setup.exe".into(),
            output_dir: "/work/output".into(),
            overwrite,
        }
    }

    #[test]
    fn args_carry_folders_setup_and_overwrite_flag() {
        let args = CommandPackagingTool::args(&request(true));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            ["-c", "/work/source", "-s", "setup.exe", "-o", "/work/output", "-q"]
        );
        assert!(!CommandPackagingTool::args(&request(false)).contains(&OsString::from("-q")));
    }

    #[tokio::test]
    async fn missing_executable_is_command_failure() {
        let tool = CommandPackagingTool::new("/nonexistent/packaging-tool", Duration::from_secs(5));
        let err = tool.package(&request(true)).await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fail.sh");
        std::fs::write(&script, "#!/bin/sh\necho 'bad setup file' >&2\nexit 3\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let tool = CommandPackagingTool::new(&script, Duration::from_secs(10));
        let err = tool.package(&request(true)).await.unwrap_err();
        match err {
            Error::ToolFailed { stderr, .. } => assert_eq!(stderr, "bad setup file"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
