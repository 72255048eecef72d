//! 注册源抽象接口
//!
//! - 延迟注册源：惰性产生恰好一个注册，与请求的服务无关
//! - 动态注册源：针对一个尚未解析的服务按需合成注册

use crate::registration::ComponentRegistration;
use infrastructure_common::{DependencyResult, Service};

/// 服务是否已注册的探测函数
///
/// 动态注册源通过它检查其他服务，探测会经过注册表的完整查找流程。
pub type RegisteredProbe<'a> = &'a dyn Fn(&Service) -> DependencyResult<bool>;

/// 延迟注册源 trait
///
/// `materialize` 消费自身，因此每个源最多被物化一次。
pub trait DeferredRegistrationSource: Send {
    /// 物化注册
    fn materialize(self: Box<Self>) -> DependencyResult<ComponentRegistration>;

    /// 注册源名称，用于诊断输出
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> DeferredRegistrationSource for F
where
    F: FnOnce() -> DependencyResult<ComponentRegistration> + Send,
{
    fn materialize(self: Box<Self>) -> DependencyResult<ComponentRegistration> {
        (*self)()
    }
}

/// 动态注册源 trait
pub trait DynamicRegistrationSource: Send + Sync {
    /// 尝试为指定服务提供注册
    ///
    /// 返回 `Ok(None)` 表示此源无法提供该服务。探测其他服务时，
    /// 避免无限递归是注册源自身的责任。
    fn try_registration(
        &self,
        service: &Service,
        is_registered: RegisteredProbe<'_>,
    ) -> DependencyResult<Option<ComponentRegistration>>;

    /// 注册源名称，用于诊断输出
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// 以闭包创建延迟注册源
pub fn deferred_source<F>(materialize: F) -> Box<dyn DeferredRegistrationSource>
where
    F: FnOnce() -> DependencyResult<ComponentRegistration> + Send + 'static,
{
    Box::new(materialize)
}
