use crate::error::{AppError, AppResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// 一次外部命令调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// 覆盖子进程的 PATH
    pub path_env: Option<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            path_env: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_env(mut self, path: OsString) -> Self {
        self.path_env = Some(path);
        self
    }

    /// 用于日志和错误信息的命令行
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(path) = &self.path_env {
            command.env("PATH", path);
        }
        command
    }
}

/// 外部命令执行接口
pub trait CommandRunner: Send + Sync {
    /// 执行命令并继承标准输出，非零退出码视为失败
    fn run(&self, spec: &CommandSpec) -> AppResult<()>;

    /// 执行命令并返回标准输出
    fn capture(&self, spec: &CommandSpec) -> AppResult<String>;

    /// 执行命令，只关心是否成功
    fn probe(&self, spec: &CommandSpec) -> bool;
}

/// 直接调用操作系统的命令执行器
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn spawn_error(spec: &CommandSpec, error: std::io::Error) -> AppError {
        AppError::CommandFailed {
            command: spec.display(),
            code: None,
            stderr: format!(": 无法启动进程: {}", error),
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> AppResult<()> {
        log::info!("执行: {}", spec.display());
        let status = spec
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| Self::spawn_error(spec, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(AppError::CommandFailed {
                command: spec.display(),
                code: status.code(),
                stderr: String::new(),
            })
        }
    }

    fn capture(&self, spec: &CommandSpec) -> AppResult<String> {
        log::info!("执行: {}", spec.display());
        let output = spec
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Self::spawn_error(spec, e))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(AppError::CommandFailed {
                command: spec.display(),
                code: output.status.code(),
                stderr: if stderr.trim().is_empty() {
                    String::new()
                } else {
                    format!(": {}", stderr.trim())
                },
            })
        }
    }

    fn probe(&self, spec: &CommandSpec) -> bool {
        log::debug!("探测: {}", spec.display());
        spec.to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

/// 以路径为参数时使用
pub fn path_arg(path: &Path) -> AppResult<String> {
    crate::error::safe_path_to_string(path)
}
