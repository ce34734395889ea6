//! 集群 inventory 定位
//!
//! 每个集群一个目录 `<inventory_dir>/inventory-<cluster_id>/`，内含 `hosts.yaml`。
//! 目录按需创建，从不删除；`hosts.yaml` 由集群部署流程写入，这里不校验内容。

use std::path::PathBuf;

use crate::error::{RegistryError, RegistryResult};

/// inventory 主机文件名
pub const HOSTS_FILE: &str = "hosts.yaml";

#[derive(Debug, Clone)]
pub struct InventoryLocator {
    root: PathBuf,
}

impl InventoryLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 集群 inventory 目录（不创建）
    pub fn cluster_dir(&self, cluster_id: &str) -> PathBuf {
        self.root.join(format!("inventory-{}", cluster_id))
    }

    /// 返回集群的 `hosts.yaml` 路径，必要时递归创建所在目录
    pub async fn resolve(&self, cluster_id: &str) -> RegistryResult<PathBuf> {
        let dir = self.cluster_dir(cluster_id);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            RegistryError::Infrastructure(format!(
                "failed to create inventory directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(dir.join(HOSTS_FILE))
    }
}
