//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn ADSP 依赖注入容器的公共值类型和错误类型。
//!
//! ## 核心类型
//!
//! - [`TypeInfo`] - 以 `TypeId` 为身份的类型信息
//! - [`Service`] - 可被请求的服务键（类型 + 可选名称）
//! - [`Lifetime`] / [`Scope`] - 生命周期描述
//! - [`DependencyError`] / [`ConfigError`] - 错误类型
//!
//! ## 设计原则
//!
//! - 值类型不可变，按契约比较相等
//! - 错误显式返回，不在库代码中 panic

pub mod errors;
pub mod lifecycle;
pub mod metadata;
pub mod service;

pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
pub use service::*;
