//! 工厂委托形状
//!
//! 委托形状是工厂的调用签名：有序的形参列表和返回类型，由调用方显式声明。

use crate::parameter::ParameterMapping;
use infrastructure_common::{DependencyError, DependencyResult, TypeInfo};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 委托种类
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DelegateKind {
    /// 通用生产者委托 `Func<A1, .., R>`，形参名称没有语义
    Producer,
    /// 自定义命名委托，形参名称有语义
    Custom(Arc<str>),
}

/// 委托形参
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormalParameter {
    /// 形参名称
    pub name: Arc<str>,
    /// 声明类型
    pub type_info: TypeInfo,
    /// 形参序号（从 0 开始）
    pub position: usize,
}

/// 委托形状
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateShape {
    kind: DelegateKind,
    parameters: Vec<FormalParameter>,
    return_type: Option<TypeInfo>,
}

impl DelegateShape {
    /// 返回 `R` 的生产者委托
    pub fn producer<R: Any + Send + Sync>() -> Self {
        Self {
            kind: DelegateKind::Producer,
            parameters: Vec::new(),
            return_type: Some(TypeInfo::of::<R>()),
        }
    }

    /// 返回 `R` 的自定义命名委托
    pub fn custom<R: Any + Send + Sync>(name: impl Into<Arc<str>>) -> Self {
        Self {
            kind: DelegateKind::Custom(name.into()),
            parameters: Vec::new(),
            return_type: Some(TypeInfo::of::<R>()),
        }
    }

    /// 没有返回值的委托，不能作为工厂
    pub fn action(name: impl Into<Arc<str>>) -> Self {
        Self {
            kind: DelegateKind::Custom(name.into()),
            parameters: Vec::new(),
            return_type: None,
        }
    }

    /// 追加一个按序号命名（`arg1`、`arg2` ...）的形参
    pub fn with_argument<T: Any + Send + Sync>(self) -> Self {
        let name = format!("arg{}", self.parameters.len() + 1);
        self.with_parameter::<T>(name)
    }

    /// 追加一个命名形参
    pub fn with_parameter<T: Any + Send + Sync>(self, name: impl Into<Arc<str>>) -> Self {
        self.with_formal(name, TypeInfo::of::<T>())
    }

    /// 追加一个以类型信息声明的形参
    pub fn with_formal(mut self, name: impl Into<Arc<str>>, type_info: TypeInfo) -> Self {
        let position = self.parameters.len();
        self.parameters.push(FormalParameter {
            name: name.into(),
            type_info,
            position,
        });
        self
    }

    /// 委托种类
    pub fn kind(&self) -> &DelegateKind {
        &self.kind
    }

    /// 是否为通用生产者委托
    pub fn is_producer(&self) -> bool {
        matches!(self.kind, DelegateKind::Producer)
    }

    /// 有序形参
    pub fn parameters(&self) -> &[FormalParameter] {
        &self.parameters
    }

    /// 返回类型
    pub fn return_type(&self) -> Option<TypeInfo> {
        self.return_type
    }

    /// 校验形状可以作为工厂，返回其产品类型
    pub fn product_type(&self) -> DependencyResult<TypeInfo> {
        let product = self.return_type.ok_or_else(|| {
            DependencyError::shape_mismatch("返回产品的函数形委托", self.to_string())
        })?;

        if let Some(formal) = self.parameters.iter().find(|p| p.name.is_empty()) {
            return Err(DependencyError::invalid_argument(
                format!("{}#{}", self, formal.position),
                "形参名称不能为空",
            ));
        }

        Ok(product)
    }

    /// 计算实际使用的参数映射策略
    ///
    /// `Adaptive` 对生产者委托取 `ByType`，其余取 `ByName`；显式配置原样返回。
    pub fn effective_mapping(&self, configured: ParameterMapping) -> ParameterMapping {
        match configured {
            ParameterMapping::Adaptive if self.is_producer() => ParameterMapping::ByType,
            ParameterMapping::Adaptive => ParameterMapping::ByName,
            explicit => explicit,
        }
    }
}

impl fmt::Display for DelegateShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parameters = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.type_info))
            .collect::<Vec<_>>()
            .join(", ");
        let name = match &self.kind {
            DelegateKind::Producer => "Func",
            DelegateKind::Custom(name) => &**name,
        };
        match self.return_type {
            Some(product) => write!(f, "{name}({parameters}) -> {product}"),
            None => write!(f, "{name}({parameters})"),
        }
    }
}
