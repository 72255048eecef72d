//! 组件注册表实现

use di_abstractions::{
    ComponentRegistration, ComponentRegistry, ContainerConfig, DeferredRegistrationSource,
    DynamicRegistrationSource, ObserverId, RegisteredObserver,
};
use infrastructure_common::{DependencyError, DependencyResult, Service};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 注册表可变状态
#[derive(Default)]
struct RegistryState {
    /// 服务 -> 默认注册
    default_registrations: HashMap<Service, Arc<ComponentRegistration>>,
    /// 全部注册（保持插入顺序）
    registrations: Vec<Arc<ComponentRegistration>>,
    /// 已确认未注册的服务
    unregistered_services: HashSet<Service>,
    /// 动态注册源（按添加顺序）
    dynamic_sources: Vec<Arc<dyn DynamicRegistrationSource>>,
    /// 每次添加动态注册源时递增
    source_generation: u64,
}

/// 组件注册表实现
///
/// 状态位于 `RwLock` 之后；调用延迟注册源、动态注册源和观察者时不持有任何状态锁，
/// 因此这些回调可以重新进入注册表。
///
/// 未命中默认映射的查找（排空延迟注册源、询问动态注册源）由一把可重入锁串行化：
/// 其他线程等待当前查找完成后重新检查默认映射，因此同一服务的动态注册源最多被询问一次；
/// 同一线程的重入调用（注册源的探测函数、观察者）可以直接进入。
/// 注册源和观察者运行期间这把锁一直被持有，它们不能阻塞等待另一个线程上的查找，否则会死锁。
pub struct ComponentRegistryImpl {
    state: RwLock<RegistryState>,
    deferred_sources: Mutex<VecDeque<Box<dyn DeferredRegistrationSource>>>,
    lookup_guard: ReentrantMutex<()>,
    observers: RwLock<Vec<(ObserverId, RegisteredObserver)>>,
    next_observer_id: AtomicU64,
    config: ContainerConfig,
}

impl ComponentRegistryImpl {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// 使用指定配置创建注册表
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            deferred_sources: Mutex::new(VecDeque::new()),
            lookup_guard: ReentrantMutex::new(()),
            observers: RwLock::new(Vec::new()),
            next_observer_id: AtomicU64::new(1),
            config,
        }
    }

    /// 注册表配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 排空延迟注册源
    ///
    /// 待处理队列先整体换出再逐个物化，物化过程中新加入的延迟注册源进入新的队列。
    /// 某个源失败时该源被丢弃，同批次中尚未物化的源放回队首，下次查找时继续。
    fn drain_deferred_sources(&self) -> DependencyResult<()> {
        let _lookup = self.lookup_guard.lock();

        let pending = std::mem::take(&mut *self.deferred_sources.lock());
        if pending.is_empty() {
            return Ok(());
        }

        debug!("排空延迟注册源: {} 个", pending.len());
        let mut pending = pending.into_iter();
        while let Some(source) = pending.next() {
            let source_name = source.name();
            let result = source
                .materialize()
                .and_then(|registration| self.register(Arc::new(registration)));

            if let Err(err) = result {
                warn!("延迟注册源 {} 失败: {}", source_name, err);
                let mut queue = self.deferred_sources.lock();
                for remaining in pending.rev() {
                    queue.push_front(remaining);
                }
                return Err(err);
            }
        }

        Ok(())
    }

    /// 无待排空的延迟注册源时直接读取默认映射
    fn registered_without_drain(&self, service: &Service) -> Option<Arc<ComponentRegistration>> {
        if !self.deferred_sources.lock().is_empty() {
            return None;
        }
        self.state.read().default_registrations.get(service).cloned()
    }

    /// 记录未注册服务
    ///
    /// 探测期间若添加了新的动态注册源，或服务已被注册，则不缓存。
    fn remember_unregistered(&self, service: &Service, generation: u64) {
        if !self.config.cache_unregistered_services {
            return;
        }

        let mut state = self.state.write();
        if state.source_generation == generation
            && !state.default_registrations.contains_key(service)
        {
            debug!("缓存未注册服务: {}", service);
            state.unregistered_services.insert(service.clone());
        }
    }

    /// 按订阅顺序同步通知观察者
    fn notify_registered(&self, registration: &Arc<ComponentRegistration>) -> DependencyResult<()> {
        let observers: Vec<RegisteredObserver> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            observer(self, registration).map_err(|err| {
                warn!("注册事件处理失败: {}, 原因: {}", registration, err);
                DependencyError::ObserverFailed {
                    registration: registration.to_string(),
                    message: err.to_string(),
                }
            })?;
        }

        Ok(())
    }
}

impl Default for ComponentRegistryImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ComponentRegistryImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ComponentRegistryImpl")
            .field("registrations", &state.registrations.len())
            .field("default_registrations", &state.default_registrations.len())
            .field("unregistered_services", &state.unregistered_services.len())
            .field("dynamic_sources", &state.dynamic_sources.len())
            .field("deferred_sources", &self.deferred_sources.lock().len())
            .field("observers", &self.observers.read().len())
            .field("config", &self.config)
            .finish()
    }
}

impl ComponentRegistry for ComponentRegistryImpl {
    fn register(&self, registration: Arc<ComponentRegistration>) -> DependencyResult<()> {
        {
            let mut state = self.state.write();
            for service in registration.services() {
                state
                    .default_registrations
                    .insert(service.clone(), Arc::clone(&registration));
                state.unregistered_services.remove(service);
            }
            state.registrations.push(Arc::clone(&registration));
        }

        info!("注册组件: {}", registration);
        self.notify_registered(&registration)
    }

    fn is_registered(&self, service: &Service) -> DependencyResult<bool> {
        Ok(self.try_get_registration(service)?.is_some())
    }

    fn try_get_registration(
        &self,
        service: &Service,
    ) -> DependencyResult<Option<Arc<ComponentRegistration>>> {
        if let Some(registration) = self.registered_without_drain(service) {
            return Ok(Some(registration));
        }

        let _lookup = self.lookup_guard.lock();
        self.drain_deferred_sources()?;

        // 等待期间其他线程可能已经注册了该服务
        let (sources, generation) = {
            let state = self.state.read();
            if let Some(registration) = state.default_registrations.get(service) {
                return Ok(Some(Arc::clone(registration)));
            }
            if state.unregistered_services.contains(service) {
                debug!("服务已确认未注册: {}", service);
                return Ok(None);
            }
            (state.dynamic_sources.clone(), state.source_generation)
        };

        let probe = |candidate: &Service| self.is_registered(candidate);
        for source in &sources {
            let supplied = source.try_registration(service, &probe).map_err(|err| {
                warn!("动态注册源 {} 为 {} 提供注册失败: {}", source.name(), service, err);
                err
            })?;

            if let Some(registration) = supplied {
                debug!("动态注册源 {} 提供了 {}", source.name(), service);
                let registration = Arc::new(registration);
                self.register(Arc::clone(&registration))?;
                return Ok(Some(registration));
            }
        }

        self.remember_unregistered(service, generation);
        Ok(None)
    }

    fn registrations_for(
        &self,
        service: &Service,
    ) -> DependencyResult<Vec<Arc<ComponentRegistration>>> {
        self.is_registered(service)?;
        Ok(self
            .registrations()?
            .into_iter()
            .filter(|registration| registration.provides(service))
            .collect())
    }

    fn registrations(&self) -> DependencyResult<Vec<Arc<ComponentRegistration>>> {
        self.drain_deferred_sources()?;
        Ok(self.state.read().registrations.clone())
    }

    fn add_deferred_source(&self, source: Box<dyn DeferredRegistrationSource>) {
        debug!("添加延迟注册源: {}", source.name());
        self.deferred_sources.lock().push_back(source);
    }

    fn add_dynamic_source(&self, source: Arc<dyn DynamicRegistrationSource>) {
        info!("添加动态注册源: {}", source.name());
        let mut state = self.state.write();
        state.dynamic_sources.push(source);
        state.unregistered_services.clear();
        state.source_generation += 1;
    }

    fn on_registered(&self, observer: RegisteredObserver) -> ObserverId {
        let id = ObserverId(self.next_observer_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        id
    }

    fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }

    fn registration_count(&self) -> usize {
        self.state.read().registrations.len()
    }
}
