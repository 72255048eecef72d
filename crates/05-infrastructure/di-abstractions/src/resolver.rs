//! 组件解析上下文抽象接口
//!
//! 解析与激活由外部子系统实现，这里只定义工厂生成器需要的最小接口。

use crate::parameter::Parameter;
use crate::registration::{AnyInstance, ComponentRegistration};
use infrastructure_common::{DependencyError, DependencyResult, Scope, Service};
use std::any::Any;
use std::sync::Arc;

/// 组件解析上下文 trait
pub trait ComponentContext: Send + Sync {
    /// 解析服务
    fn resolve_service(
        &self,
        service: &Service,
        parameters: &[Parameter],
    ) -> DependencyResult<AnyInstance>;

    /// 直接激活指定注册
    fn resolve_registration(
        &self,
        registration: &Arc<ComponentRegistration>,
        parameters: &[Parameter],
    ) -> DependencyResult<AnyInstance>;

    /// 获取当前生命周期作用域
    fn lifetime_scope(&self) -> DependencyResult<Arc<dyn LifetimeScope>>;
}

/// 生命周期作用域 trait
pub trait LifetimeScope: ComponentContext {
    /// 作用域描述
    fn scope(&self) -> &Scope;
}

/// 类型化解析扩展
pub trait ComponentContextExt: ComponentContext {
    /// 解析指定类型的服务
    fn resolve<T: Any + Send + Sync>(&self) -> DependencyResult<Arc<T>> {
        self.resolve_with::<T>(&[])
    }

    /// 带参数解析指定类型的服务
    fn resolve_with<T: Any + Send + Sync>(
        &self,
        parameters: &[Parameter],
    ) -> DependencyResult<Arc<T>> {
        let service = Service::of::<T>();
        let instance = self.resolve_service(&service, parameters)?;
        downcast_instance(instance, &service)
    }

    /// 解析指定名称的服务
    fn resolve_named<T: Any + Send + Sync>(&self, name: &str) -> DependencyResult<Arc<T>> {
        let service = Service::named::<T>(name)?;
        let instance = self.resolve_service(&service, &[])?;
        downcast_instance(instance, &service)
    }
}

impl<C: ComponentContext + ?Sized> ComponentContextExt for C {}

/// 将装箱实例转换为具体类型
pub fn downcast_instance<T: Any + Send + Sync>(
    instance: AnyInstance,
    service: &Service,
) -> DependencyResult<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| DependencyError::DependencyResolutionFailed {
            type_name: service.to_string(),
            message: format!("解析结果不是 {}", std::any::type_name::<T>()),
        })
}
