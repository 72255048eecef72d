//! 基于注册表的最小生命周期作用域
//!
//! 每次解析都查找默认注册并直接激活，不共享实例，也不负责释放。

use di_abstractions::{
    AnyInstance, ComponentContext, ComponentRegistration, ComponentRegistry, LifetimeScope,
    Parameter,
};
use infrastructure_common::{DependencyError, DependencyResult, Scope, Service};
use std::sync::{Arc, Weak};
use tracing::debug;

/// 注册表生命周期作用域
pub struct RegistryLifetimeScope {
    scope: Scope,
    registry: Arc<dyn ComponentRegistry>,
    this: Weak<RegistryLifetimeScope>,
}

impl RegistryLifetimeScope {
    /// 创建根作用域
    pub fn new(registry: Arc<dyn ComponentRegistry>) -> Arc<Self> {
        Self::with_scope(registry, Scope::root())
    }

    fn with_scope(registry: Arc<dyn ComponentRegistry>, scope: Scope) -> Arc<Self> {
        debug!("创建生命周期作用域: {} ({})", scope.name, scope.id);
        Arc::new_cyclic(|this| Self {
            scope,
            registry,
            this: this.clone(),
        })
    }

    /// 创建共享同一注册表的子作用域
    pub fn begin_child(&self, name: impl Into<String>) -> Arc<Self> {
        Self::with_scope(Arc::clone(&self.registry), self.scope.child(name))
    }

    /// 作用域使用的注册表
    pub fn registry(&self) -> &Arc<dyn ComponentRegistry> {
        &self.registry
    }
}

impl ComponentContext for RegistryLifetimeScope {
    fn resolve_service(
        &self,
        service: &Service,
        parameters: &[Parameter],
    ) -> DependencyResult<AnyInstance> {
        let registration = self.registry.try_get_registration(service)?.ok_or_else(|| {
            DependencyError::ComponentNotRegistered {
                type_name: service.to_string(),
            }
        })?;
        self.resolve_registration(&registration, parameters)
    }

    fn resolve_registration(
        &self,
        registration: &Arc<ComponentRegistration>,
        parameters: &[Parameter],
    ) -> DependencyResult<AnyInstance> {
        registration.activate(self, parameters)
    }

    fn lifetime_scope(&self) -> DependencyResult<Arc<dyn LifetimeScope>> {
        self.this
            .upgrade()
            .map(|scope| scope as Arc<dyn LifetimeScope>)
            .ok_or_else(|| DependencyError::DependencyResolutionFailed {
                type_name: self.scope.name.clone(),
                message: "生命周期作用域已释放".to_string(),
            })
    }
}

impl LifetimeScope for RegistryLifetimeScope {
    fn scope(&self) -> &Scope {
        &self.scope
    }
}

impl std::fmt::Debug for RegistryLifetimeScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryLifetimeScope")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
