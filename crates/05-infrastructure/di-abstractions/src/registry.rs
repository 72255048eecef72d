//! 组件注册表抽象接口

use crate::registration::ComponentRegistration;
use crate::source::{DeferredRegistrationSource, DynamicRegistrationSource};
use infrastructure_common::{DependencyResult, Service};
use std::sync::Arc;

/// 注册事件观察者
///
/// 每次注册后同步调用，参数为注册表和刚加入的注册。
pub type RegisteredObserver = Arc<
    dyn Fn(&dyn ComponentRegistry, &Arc<ComponentRegistration>) -> DependencyResult<()>
        + Send
        + Sync,
>;

/// 以闭包创建注册事件观察者
pub fn registered_observer<F>(observer: F) -> RegisteredObserver
where
    F: Fn(&dyn ComponentRegistry, &Arc<ComponentRegistration>) -> DependencyResult<()>
        + Send
        + Sync
        + 'static,
{
    Arc::new(observer)
}

/// 观察者订阅标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

/// 组件注册表 trait
///
/// 服务到注册的唯一权威映射。每个已注册服务恰有一个默认注册（后注册者覆盖），
/// 未命中时先排空延迟注册源，再按添加顺序询问动态注册源，并缓存否定结果。
pub trait ComponentRegistry: Send + Sync {
    /// 注册组件
    ///
    /// 为声明的每个服务安装默认映射后再通知观察者；观察者失败时错误向上传播，
    /// 但注册已经生效。
    fn register(&self, registration: Arc<ComponentRegistration>) -> DependencyResult<()>;

    /// 检查服务是否已注册
    fn is_registered(&self, service: &Service) -> DependencyResult<bool>;

    /// 获取服务的默认注册
    fn try_get_registration(
        &self,
        service: &Service,
    ) -> DependencyResult<Option<Arc<ComponentRegistration>>>;

    /// 获取提供指定服务的全部注册（按注册顺序）
    fn registrations_for(&self, service: &Service)
        -> DependencyResult<Vec<Arc<ComponentRegistration>>>;

    /// 获取全部注册的快照
    fn registrations(&self) -> DependencyResult<Vec<Arc<ComponentRegistration>>>;

    /// 添加延迟注册源
    fn add_deferred_source(&self, source: Box<dyn DeferredRegistrationSource>);

    /// 添加动态注册源，同时清空未注册服务缓存
    fn add_dynamic_source(&self, source: Arc<dyn DynamicRegistrationSource>);

    /// 订阅注册事件
    fn on_registered(&self, observer: RegisteredObserver) -> ObserverId;

    /// 取消订阅
    fn remove_observer(&self, id: ObserverId) -> bool;

    /// 已存储的注册数量（不排空延迟注册源）
    fn registration_count(&self) -> usize;
}
