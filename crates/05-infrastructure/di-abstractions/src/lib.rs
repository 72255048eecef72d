//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件注册、注册源、注册表和工厂委托形状的核心接口。
//!
//! ## 核心接口
//!
//! - [`ComponentRegistration`] - 组件注册描述
//! - [`DeferredRegistrationSource`] / [`DynamicRegistrationSource`] - 延迟/动态注册源
//! - [`ComponentRegistry`] - 组件注册表接口
//! - [`ComponentContext`] / [`LifetimeScope`] - 解析上下文（由外部解析子系统实现）
//! - [`DelegateShape`] / [`ParameterMapping`] - 工厂委托形状与参数映射策略
//!
//! ## 并发约定
//!
//! 所有接口都以 `&self` 暴露，实现负责内部同步。查找操作可能产生写入
//! （排空延迟注册源、缓存未注册服务、登记动态注册源的结果）。

pub mod container;
pub mod factory;
pub mod parameter;
pub mod registration;
pub mod registry;
pub mod resolver;
pub mod source;

pub use container::*;
pub use factory::*;
pub use parameter::*;
pub use registration::*;
pub use registry::*;
pub use resolver::*;
pub use source::*;
