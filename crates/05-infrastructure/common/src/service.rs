//! 服务键定义
//!
//! [`Service`] 标识一个可被请求的服务：服务类型加上可选的名称限定。

use crate::errors::{DependencyError, DependencyResult};
use crate::metadata::TypeInfo;
use std::fmt;
use std::sync::Arc;

/// 服务键
///
/// 不可变值，按 (类型, 名称) 比较相等，可作为注册索引的键。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Service {
    type_info: TypeInfo,
    name: Option<Arc<str>>,
}

impl Service {
    /// 按类型标识的服务
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::typed(TypeInfo::of::<T>())
    }

    /// 按类型信息标识的服务
    pub fn typed(type_info: TypeInfo) -> Self {
        Self {
            type_info,
            name: None,
        }
    }

    /// 按名称限定的服务
    ///
    /// 名称不能为空。
    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> DependencyResult<Self> {
        Self::keyed(TypeInfo::of::<T>(), name)
    }

    /// 按类型信息和名称限定的服务
    pub fn keyed(type_info: TypeInfo, name: impl Into<String>) -> DependencyResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(DependencyError::invalid_argument(
                "name",
                "服务名称不能为空",
            ));
        }
        Ok(Self {
            type_info,
            name: Some(Arc::from(name)),
        })
    }

    /// 服务类型
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    /// 服务名称
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.type_info),
            None => write!(f, "{}", self.type_info),
        }
    }
}
