//! 领域模型模块
//!
//! 纯数据结构，不依赖 axum/tokio

pub mod registry;

pub use registry::{
    DomainInfo, HostJobResult, RegistryConfigEntry, RegistryEndpointRequest, RegistryOperation,
    ResultEnvelope, TargetHost,
};
