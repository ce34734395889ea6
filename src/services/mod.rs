//! 业务服务模块

pub mod registry;
