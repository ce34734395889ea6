//! 基础设施模块
//!
//! 封装外部依赖（命令执行、文件系统）

pub mod artifact_store;
pub mod command;
pub mod inventory;

pub use artifact_store::{ArtifactStore, FsArtifactStore};
pub use command::{CommandRunner, JobInvocation, TokioCommandRunner};
pub use inventory::InventoryLocator;
