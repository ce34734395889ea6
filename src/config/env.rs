//! 环境变量配置加载

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use constants::{DEFAULT_ARTIFACT_ROOT, DEFAULT_JOB_TIMEOUT_SECS, DEFAULT_PORT};

/// 环境配置
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// API 密钥
    pub api_key: String,
    /// 服务监听端口
    pub port: u16,
    /// 编排相关路径与参数
    pub registry: RegistryConfig,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        // API Key - 支持旧名称兼容
        let api_key = load_with_fallback("REGISTRY_AGENT_API_KEY", "API_KEY")
            .unwrap_or_else(|| "change-me-in-production".to_string());
        if env::var("REGISTRY_AGENT_API_KEY").is_err() && env::var("API_KEY").is_ok() {
            warn!("Deprecated environment variable API_KEY detected. Please use REGISTRY_AGENT_API_KEY");
        }

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            api_key,
            port,
            registry: RegistryConfig::from_env(),
        }
    }
}

/// 查询产物根目录的作用域
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactScope {
    /// 所有集群共用同一个根目录（与旧版本兼容）
    Shared,
    /// 每个集群一个子目录 `<root>/<cluster_id>`
    Cluster,
}

impl ArtifactScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactScope::Shared => "shared",
            ArtifactScope::Cluster => "cluster",
        }
    }
}

impl FromStr for ArtifactScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shared" => Ok(ArtifactScope::Shared),
            "cluster" | "per-cluster" => Ok(ArtifactScope::Cluster),
            other => Err(format!("unknown artifact scope: {}", other)),
        }
    }
}

/// 编排配置
///
/// 所有路径在启动时确定并显式传入，运行期间不再读取进程工作目录
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// 集群 inventory 根目录
    pub inventory_dir: PathBuf,
    /// playbook 所在目录（任务工作目录）
    pub playbook_dir: PathBuf,
    /// SSH 私钥路径
    pub private_key: PathBuf,
    /// query 产物根目录
    pub artifact_root: PathBuf,
    pub artifact_scope: ArtifactScope,
    /// ansible-playbook 可执行文件
    pub ansible_bin: String,
    /// 单次任务超时
    pub job_timeout: Duration,
}

impl RegistryConfig {
    /// 以 `base` 为基准的默认布局
    pub fn with_base_dir(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        Self {
            inventory_dir: base.join("data").join("inventory"),
            playbook_dir: base.join("registry_config"),
            private_key: base.join("ssh").join("id_rsa"),
            artifact_root: PathBuf::from(DEFAULT_ARTIFACT_ROOT),
            artifact_scope: ArtifactScope::Shared,
            ansible_bin: "ansible-playbook".to_string(),
            job_timeout: Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
        }
    }

    /// 从环境变量加载
    pub fn from_env() -> Self {
        let base = env::var("REGISTRY_AGENT_BASE_DIR")
            .map(PathBuf::from)
            .or_else(|_| env::current_dir())
            .unwrap_or_else(|_| PathBuf::from("."));
        let mut config = Self::with_base_dir(&base);

        if let Ok(v) = env::var("REGISTRY_INVENTORY_DIR") {
            config.inventory_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("REGISTRY_PLAYBOOK_DIR") {
            config.playbook_dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("REGISTRY_PRIVATE_KEY") {
            config.private_key = PathBuf::from(v);
        }
        if let Ok(v) = env::var("REGISTRY_ARTIFACT_ROOT") {
            config.artifact_root = PathBuf::from(v);
        }
        if let Ok(v) = env::var("REGISTRY_ARTIFACT_SCOPE") {
            config.artifact_scope = v.parse().unwrap_or_else(|e| {
                warn!(value = %v, error = %e, "Invalid REGISTRY_ARTIFACT_SCOPE, using shared");
                ArtifactScope::Shared
            });
        }
        if let Ok(v) = env::var("ANSIBLE_PLAYBOOK_BIN") {
            config.ansible_bin = v;
        }
        if let Some(secs) = env::var("REGISTRY_JOB_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.job_timeout = Duration::from_secs(secs);
        }

        config
    }

    /// 某个集群 query 产物所在根目录
    pub fn artifact_root_for(&self, cluster_id: &str) -> PathBuf {
        match self.artifact_scope {
            ArtifactScope::Shared => self.artifact_root.clone(),
            ArtifactScope::Cluster => self.artifact_root.join(cluster_id),
        }
    }
}

/// 加载环境变量，支持 fallback
fn load_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    env::var(primary).ok().or_else(|| env::var(fallback).ok())
}

/// 常量
pub mod constants {
    /// 默认监听端口
    pub const DEFAULT_PORT: u16 = 9877;

    /// query 产物默认根目录
    pub const DEFAULT_ARTIFACT_ROOT: &str = "/tmp/registry_config";

    /// 单次 ansible 任务默认超时（秒）
    pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 1800; // 30 分钟

    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
