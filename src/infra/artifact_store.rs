//! 查询产物存储
//!
//! query.yml 执行后，ansible 会把每台主机的 registry 配置拉回控制节点：
//!
//! ```text
//! <artifact_root>/
//!   10.0.0.11/
//!     harbor.example.com.toml
//!   10.0.0.12/
//! ```
//!
//! `ArtifactStore` 抽象目录遍历和文件读取，`ConfigAggregator` 只依赖这个 trait。

use async_trait::async_trait;
use std::path::Path;

use crate::error::{RegistryError, RegistryResult};

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// `root` 下一级的目录名（按名称排序）
    async fn list_host_dirs(&self, root: &Path) -> RegistryResult<Vec<String>>;

    /// 主机目录下的文件名（按名称排序，不含子目录）
    async fn list_files(&self, host_dir: &Path) -> RegistryResult<Vec<String>>;

    async fn read_file(&self, path: &Path) -> RegistryResult<String>;
}

/// 本地文件系统实现
#[derive(Debug, Clone, Default)]
pub struct FsArtifactStore;

impl FsArtifactStore {
    async fn list_entries(dir: &Path, want_dirs: bool) -> RegistryResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
            RegistryError::Infrastructure(format!("failed to read {}: {}", dir.display(), e))
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            // file_type() 不跟随符号链接
            let is_dir = entry.file_type().await?.is_dir();
            if is_dir == want_dirs {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn list_host_dirs(&self, root: &Path) -> RegistryResult<Vec<String>> {
        Self::list_entries(root, true).await
    }

    async fn list_files(&self, host_dir: &Path) -> RegistryResult<Vec<String>> {
        Self::list_entries(host_dir, false).await
    }

    async fn read_file(&self, path: &Path) -> RegistryResult<String> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            RegistryError::Infrastructure(format!("failed to read {}: {}", path.display(), e))
        })?;
        // 读到了但不是 UTF-8，属于产物内容问题
        String::from_utf8(bytes).map_err(|e| {
            RegistryError::Parse(format!("{}: not valid UTF-8: {}", path.display(), e))
        })
    }
}
