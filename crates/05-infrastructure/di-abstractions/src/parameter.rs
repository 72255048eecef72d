//! 依赖参数与参数映射策略
//!
//! 工厂委托被调用时，实参会被包装成 [`Parameter`] 传给解析调用，
//! 由激活器按类型、位置或名称与构造参数匹配。

use crate::registration::AnyInstance;
use infrastructure_common::TypeInfo;
use serde::Deserialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 参数映射策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterMapping {
    /// 按声明类型匹配
    ByType,
    /// 按参数名称匹配
    ByName,
    /// 按参数位置匹配
    ByPosition,
    /// 生产者委托使用 `ByType`，其余使用 `ByName`
    #[default]
    Adaptive,
}

impl fmt::Display for ParameterMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ByType => "by_type",
            Self::ByName => "by_name",
            Self::ByPosition => "by_position",
            Self::Adaptive => "adaptive",
        };
        f.write_str(text)
    }
}

/// 依赖参数
///
/// 包装一个装箱的参数值以及用于匹配的键。
#[derive(Clone)]
pub enum Parameter {
    /// 按类型匹配的参数
    Typed { type_info: TypeInfo, value: AnyInstance },
    /// 按位置匹配的参数
    Positional { position: usize, value: AnyInstance },
    /// 按名称匹配的参数
    Named { name: Arc<str>, value: AnyInstance },
}

impl Parameter {
    /// 创建按类型匹配的参数
    pub fn typed(type_info: TypeInfo, value: AnyInstance) -> Self {
        Self::Typed { type_info, value }
    }

    /// 以值的静态类型创建按类型匹配的参数
    pub fn typed_value<T: Any + Send + Sync>(value: T) -> Self {
        Self::typed(TypeInfo::of::<T>(), Arc::new(value))
    }

    /// 创建按位置匹配的参数
    pub fn positional(position: usize, value: AnyInstance) -> Self {
        Self::Positional { position, value }
    }

    /// 创建按名称匹配的参数
    pub fn named(name: impl Into<Arc<str>>, value: AnyInstance) -> Self {
        Self::Named {
            name: name.into(),
            value,
        }
    }

    /// 参数值
    pub fn value(&self) -> &AnyInstance {
        match self {
            Self::Typed { value, .. } | Self::Positional { value, .. } | Self::Named { value, .. } => {
                value
            }
        }
    }

    /// 以指定类型读取参数值
    pub fn value_as<T: Any>(&self) -> Option<&T> {
        self.value().downcast_ref::<T>()
    }

    /// 在参数列表中查找按名称匹配的参数，同名时后声明者优先
    pub fn find_named<'a>(parameters: &'a [Parameter], name: &str) -> Option<&'a Parameter> {
        parameters
            .iter()
            .rev()
            .find(|p| matches!(p, Self::Named { name: n, .. } if &**n == name))
    }

    /// 在参数列表中查找按类型匹配的参数，同类型时后声明者优先
    pub fn find_typed<'a>(parameters: &'a [Parameter], type_info: TypeInfo) -> Option<&'a Parameter> {
        parameters
            .iter()
            .rev()
            .find(|p| matches!(p, Self::Typed { type_info: t, .. } if *t == type_info))
    }

    /// 在参数列表中查找按位置匹配的参数
    pub fn find_positional(parameters: &[Parameter], position: usize) -> Option<&Parameter> {
        parameters
            .iter()
            .rev()
            .find(|p| matches!(p, Self::Positional { position: i, .. } if *i == position))
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Typed { type_info, .. } => f
                .debug_struct("Typed")
                .field("type_info", &type_info.name)
                .finish_non_exhaustive(),
            Self::Positional { position, .. } => f
                .debug_struct("Positional")
                .field("position", position)
                .finish_non_exhaustive(),
            Self::Named { name, .. } => f
                .debug_struct("Named")
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}
