//! 命令执行器的测试替身

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::infra::command::{CommandError, CommandRunner, JobInvocation, JobOutput};

/// 单台主机的预设结果
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Success,
    SuccessWithStderr(&'static str),
    Exit(i32, &'static str),
    SpawnFailure,
}

/// 记录每次调用，按主机返回预设结果
///
/// 主机取自 `--limit` 参数；没有 `--limit` 的调用（全集群查询）记为 `"*"`。
/// 未预设的主机一律成功。
#[derive(Default)]
pub struct FakeRunner {
    outcomes: HashMap<String, Outcome>,
    calls: Mutex<Vec<JobInvocation>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    on_run: Option<Box<dyn Fn() + Send + Sync>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, host: &str, outcome: Outcome) -> Self {
        self.outcomes.insert(host.to_string(), outcome);
        self
    }

    /// 每次运行时执行的钩子（如写入查询产物）
    pub fn on_run(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_run = Some(Box::new(hook));
        self
    }

    pub fn calls(&self) -> Vec<JobInvocation> {
        self.calls.lock().unwrap().clone()
    }

    /// 按调用顺序排列的主机
    pub fn hosts(&self) -> Vec<String> {
        self.calls().iter().map(limit_of).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn limit_of(invocation: &JobInvocation) -> String {
    invocation
        .args
        .iter()
        .position(|a| a == "--limit")
        .and_then(|i| invocation.args.get(i + 1))
        .cloned()
        .unwrap_or_else(|| "*".to_string())
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &JobInvocation) -> Result<JobOutput, CommandError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(invocation.clone());

        // 让出执行权，并发启动的任务会在这里重叠
        tokio::task::yield_now().await;
        if let Some(hook) = &self.on_run {
            hook();
        }

        let outcome = self
            .outcomes
            .get(&limit_of(invocation))
            .copied()
            .unwrap_or(Outcome::Success);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match outcome {
            Outcome::Success => Ok(JobOutput {
                exit_code: Some(0),
                ..Default::default()
            }),
            Outcome::SuccessWithStderr(stderr) => Ok(JobOutput {
                exit_code: Some(0),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
            Outcome::Exit(code, stderr) => Ok(JobOutput {
                exit_code: Some(code),
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
            Outcome::SpawnFailure => Err(CommandError::SpawnFailed(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "ansible-playbook not found",
            ))),
        }
    }
}
