//! # 依赖注入具体实现
//!
//! 提供组件注册表、工厂生成器和基于注册表的最小生命周期作用域。
//!
//! - [`ComponentRegistryImpl`] - 线程安全的组件注册表，支持延迟/动态注册源和注册事件
//! - [`FactoryGenerator`] - 按委托形状生成绑定到作用域的工厂委托
//! - [`RegistryLifetimeScope`] - 直接激活默认注册的生命周期作用域
//! - [`load_container_config`] - 从配置文件和环境变量加载容器配置

pub mod config;
pub mod factory;
pub mod registry;
pub mod scope;

pub use config::*;
pub use factory::*;
pub use registry::*;
pub use scope::*;
