//! 镜像仓库 mirror 端点服务
//!
//! 编排 ansible 任务并汇总查询结果

pub mod aggregator;
pub mod credentials;
pub mod invoker;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregator::ConfigAggregator;
pub use credentials::encode_credentials;
pub use invoker::JobInvoker;
pub use orchestrator::RegistryOrchestrator;
