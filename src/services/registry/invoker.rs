//! 任务执行
//!
//! 运行一次自动化命令直到结束，把进程结果转换成 `HostJobResult`。
//! 成功运行时的 stderr 只记录日志，不视为失败。

use std::sync::Arc;

use crate::domain::registry::HostJobResult;
use crate::error::{RegistryError, RegistryResult};
use crate::infra::command::{CommandRunner, JobInvocation};

/// 单次任务执行器
#[derive(Clone)]
pub struct JobInvoker {
    runner: Arc<dyn CommandRunner>,
}

impl JobInvoker {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// 执行命令并返回结果
    pub async fn invoke(&self, invocation: &JobInvocation) -> HostJobResult {
        tracing::debug!(command = %invocation.display(), work_dir = %invocation.work_dir.display(), "Running job");

        let output = match self.runner.run(invocation).await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(command = %invocation.program, error = %e, "Job could not be executed");
                return HostJobResult::failed(e.to_string());
            }
        };

        for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            tracing::debug!(target: "registry_mirror_agent::job", "{}", line);
        }

        if output.success() {
            for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
                tracing::warn!(target: "registry_mirror_agent::job", "stderr: {}", line);
            }
            return HostJobResult::succeeded(output.stderr);
        }

        let code = output
            .exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        tracing::error!(exit_code = %code, stderr = %output.stderr.trim(), "Job failed");
        HostJobResult::failed(format!(
            "command exited with {}: {}",
            code,
            output.stderr.trim()
        ))
    }

    /// 同 `invoke`，失败时转为 `ExecutionError`
    pub async fn run(&self, invocation: &JobInvocation) -> RegistryResult<()> {
        let result = self.invoke(invocation).await;
        if result.success {
            Ok(())
        } else {
            Err(RegistryError::Execution(result.diagnostic))
        }
    }
}
