//! 镜像仓库 mirror 端点领域模型

use serde::{Deserialize, Serialize};

/// 成功码
pub const CODE_OK: u32 = 20000;
/// 失败码
pub const CODE_ERROR: u32 = 50000;

/// 目标主机
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHost {
    pub host_name: String,
}

impl TargetHost {
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
        }
    }
}

/// 添加 / 删除端点请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEndpointRequest {
    pub cluster_id: String,
    /// mirror 端点地址，如 `https://harbor.example.com`
    pub image_addr: String,
    #[serde(rename = "registryIP", default)]
    pub registry_ip: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub passwd: Option<String>,
    /// 按顺序逐台执行
    #[serde(default)]
    pub hosts: Vec<TargetHost>,
}

/// 端点操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryOperation {
    Add,
    Remove,
    Query,
}

impl RegistryOperation {
    /// 对应的 playbook 文件
    pub fn playbook(&self) -> &'static str {
        match self {
            RegistryOperation::Add => "add.yml",
            RegistryOperation::Remove => "delete.yml",
            RegistryOperation::Query => "query.yml",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            RegistryOperation::Add => "Registry endpoint added",
            RegistryOperation::Remove => "Registry endpoint removed",
            RegistryOperation::Query => "Registry endpoints queried",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            RegistryOperation::Add => "Failed to add registry endpoint",
            RegistryOperation::Remove => "Failed to remove registry endpoint",
            RegistryOperation::Query => "Failed to query registry endpoints",
        }
    }
}

impl std::fmt::Display for RegistryOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RegistryOperation::Add => "add",
            RegistryOperation::Remove => "remove",
            RegistryOperation::Query => "query",
        };
        write!(f, "{}", s)
    }
}

/// 单台主机一次调用的结果，只在编排过程中存在
#[derive(Debug, Clone)]
pub struct HostJobResult {
    pub success: bool,
    /// 失败原因或 stderr 内容
    pub diagnostic: String,
}

impl HostJobResult {
    pub fn succeeded(diagnostic: impl Into<String>) -> Self {
        Self {
            success: true,
            diagnostic: diagnostic.into(),
        }
    }

    pub fn failed(diagnostic: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostic: diagnostic.into(),
        }
    }
}

/// 单个 registry 域名的配置
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainInfo {
    pub domain: String,
    /// 原样复制产物中的 capabilities；未声明时不输出
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<toml::Value>,
    /// 仅当产物声明了 `header.authorization` 时存在
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
}

/// 一台主机的查询结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryConfigEntry {
    #[serde(rename = "hostIP")]
    pub host_ip: String,
    pub domains: Vec<DomainInfo>,
}

/// 信封状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Ok,
    Error,
}

/// 统一响应信封
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope<T> {
    pub code: u32,
    pub data: T,
    pub msg: String,
    pub status: EnvelopeStatus,
}

impl<T> ResultEnvelope<T> {
    pub fn ok(data: T, msg: impl Into<String>) -> Self {
        Self {
            code: CODE_OK,
            data,
            msg: msg.into(),
            status: EnvelopeStatus::Ok,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }
}

impl<T: Default> ResultEnvelope<T> {
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            code: CODE_ERROR,
            data: T::default(),
            msg: msg.into(),
            status: EnvelopeStatus::Error,
        }
    }
}
