//! 依赖注入容器配置

use crate::parameter::ParameterMapping;
use serde::Deserialize;

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 生成工厂时默认使用的参数映射策略
    pub default_parameter_mapping: ParameterMapping,
    /// 是否缓存确认未注册的服务
    ///
    /// 关闭后每次未命中都会重新询问动态注册源。
    pub cache_unregistered_services: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            default_parameter_mapping: ParameterMapping::Adaptive,
            cache_unregistered_services: true,
        }
    }
}
