//! 应用状态

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 全局 shutdown token，用于优雅关闭
static GLOBAL_SHUTDOWN: std::sync::OnceLock<CancellationToken> = std::sync::OnceLock::new();

/// 获取全局 shutdown token
pub fn get_shutdown_token() -> CancellationToken {
    GLOBAL_SHUTDOWN
        .get_or_init(CancellationToken::new)
        .clone()
}

/// 触发全局 shutdown
pub fn trigger_shutdown() {
    if let Some(token) = GLOBAL_SHUTDOWN.get() {
        token.cancel();
    }
}

use crate::config::EnvConfig;
use crate::infra::{FsArtifactStore, TokioCommandRunner};
use crate::services::registry::RegistryOrchestrator;

/// 应用状态
///
/// 请求之间除文件系统外没有共享的可变状态
pub struct AppState {
    /// API 密钥（用于验证请求）
    pub api_key: String,
    /// 环境配置
    pub config: EnvConfig,
    /// 服务启动时间
    pub started_at: DateTime<Utc>,
    /// 端点编排器
    pub registry: RegistryOrchestrator,
}

impl AppState {
    /// 使用真实的命令执行器和文件系统创建应用状态
    pub fn new(config: EnvConfig) -> Self {
        tracing::info!(
            api_key_len = config.api_key.len(),
            port = config.port,
            inventory_dir = %config.registry.inventory_dir.display(),
            playbook_dir = %config.registry.playbook_dir.display(),
            artifact_root = %config.registry.artifact_root.display(),
            artifact_scope = ?config.registry.artifact_scope,
            job_timeout_secs = config.registry.job_timeout.as_secs(),
            "Loaded configuration"
        );

        let runner = Arc::new(TokioCommandRunner::new(config.registry.job_timeout));
        let registry =
            RegistryOrchestrator::new(config.registry.clone(), runner, Arc::new(FsArtifactStore));
        Self::with_orchestrator(config, registry)
    }

    /// 使用给定的编排器创建（测试中注入假实现）
    pub fn with_orchestrator(config: EnvConfig, registry: RegistryOrchestrator) -> Self {
        Self {
            api_key: config.api_key.clone(),
            config,
            started_at: Utc::now(),
            registry,
        }
    }
}
