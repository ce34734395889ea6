//! 命令执行器
//!
//! 外部自动化工具（ansible-playbook）调用的抽象边界：
//! - `CommandRunner` trait：一次调用 = 一个进程，跑到结束
//! - `TokioCommandRunner`：基于 `tokio::process` 的真实实现，带超时
//! - stdout/stderr 分离捕获

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::error;

/// 一次外部命令调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInvocation {
    /// 要执行的程序
    pub program: String,
    /// 命令行参数（argv，不经过 shell）
    pub args: Vec<String>,
    /// 工作目录
    pub work_dir: PathBuf,
}

impl JobInvocation {
    pub fn new(program: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: work_dir.into(),
        }
    }

    /// 追加一个参数
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// 追加 `-e key=value` 模板变量
    pub fn extra_var(self, key: &str, value: impl AsRef<str>) -> Self {
        self.arg("-e").arg(format!("{}={}", key, value.as_ref()))
    }

    /// 可读的命令行（仅用于日志）
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// 进程结束后的输出
#[derive(Debug, Clone, Default)]
pub struct JobOutput {
    /// 退出码（被信号终止时为 None）
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl JobOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// 命令执行错误
#[derive(Debug)]
pub enum CommandError {
    /// 命令启动失败
    SpawnFailed(std::io::Error),
    /// 命令超时
    Timeout(Duration),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::SpawnFailed(e) => write!(f, "Failed to spawn command: {}", e),
            CommandError::Timeout(d) => write!(f, "Command timed out after {:?}", d),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::SpawnFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// 外部命令执行能力
///
/// 编排逻辑只依赖这个 trait，测试中可替换为假实现
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &JobInvocation) -> Result<JobOutput, CommandError>;
}

/// 基于 tokio 的命令执行器
#[derive(Debug, Clone)]
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, invocation: &JobInvocation) -> Result<JobOutput, CommandError> {
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // 超时后 future 被丢弃，进程随之被 kill
            .kill_on_drop(true)
            .output();

        tokio::select! {
            result = child => {
                let output = result.map_err(CommandError::SpawnFailed)?;
                Ok(JobOutput {
                    exit_code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
            _ = tokio::time::sleep(self.timeout) => {
                error!(command = %invocation.program, "Command timed out after {:?}", self.timeout);
                Err(CommandError::Timeout(self.timeout))
            }
        }
    }
}
