//! 组件注册描述

use crate::parameter::Parameter;
use crate::resolver::ComponentContext;
use infrastructure_common::{DependencyError, DependencyResult, Lifetime, Service, TypeInfo};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// 装箱的组件实例
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

/// 实例激活器 trait
///
/// 注册的激活策略：给定解析上下文和依赖参数，产生一个组件实例。
pub trait InstanceActivator: Send + Sync {
    /// 激活器产生的实例类型
    fn limit_type(&self) -> TypeInfo;

    /// 创建组件实例
    fn activate(
        &self,
        context: &dyn ComponentContext,
        parameters: &[Parameter],
    ) -> DependencyResult<AnyInstance>;
}

type ActivatorFn =
    dyn Fn(&dyn ComponentContext, &[Parameter]) -> DependencyResult<AnyInstance> + Send + Sync;

/// 委托激活器，通过闭包创建实例
pub struct DelegateActivator {
    limit_type: TypeInfo,
    activation: Arc<ActivatorFn>,
}

impl DelegateActivator {
    /// 创建委托激活器
    pub fn new<T, F>(activation: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&dyn ComponentContext, &[Parameter]) -> DependencyResult<T> + Send + Sync + 'static,
    {
        Self {
            limit_type: TypeInfo::of::<T>(),
            activation: Arc::new(move |context: &dyn ComponentContext, parameters: &[Parameter]| {
                activation(context, parameters).map(|instance| Arc::new(instance) as AnyInstance)
            }),
        }
    }
}

impl InstanceActivator for DelegateActivator {
    fn limit_type(&self) -> TypeInfo {
        self.limit_type
    }

    fn activate(
        &self,
        context: &dyn ComponentContext,
        parameters: &[Parameter],
    ) -> DependencyResult<AnyInstance> {
        (self.activation)(context, parameters)
    }
}

/// 预先提供实例的激活器，每次激活返回同一个实例
pub struct ProvidedInstanceActivator {
    limit_type: TypeInfo,
    instance: AnyInstance,
}

impl ProvidedInstanceActivator {
    /// 创建实例激活器
    pub fn new<T: Any + Send + Sync>(instance: T) -> Self {
        Self {
            limit_type: TypeInfo::of::<T>(),
            instance: Arc::new(instance),
        }
    }
}

impl InstanceActivator for ProvidedInstanceActivator {
    fn limit_type(&self) -> TypeInfo {
        self.limit_type
    }

    fn activate(
        &self,
        _context: &dyn ComponentContext,
        _parameters: &[Parameter],
    ) -> DependencyResult<AnyInstance> {
        Ok(Arc::clone(&self.instance))
    }
}

/// 组件注册信息
///
/// 插入注册表后不可变，注册表以 `Arc` 共享持有。
pub struct ComponentRegistration {
    id: Uuid,
    services: Vec<Service>,
    activator: Arc<dyn InstanceActivator>,
    lifetime: Lifetime,
    metadata: HashMap<String, String>,
}

impl ComponentRegistration {
    /// 创建组件注册
    ///
    /// 至少需要声明一个服务；重复的服务按首次出现的顺序去重。
    pub fn new<A>(services: impl IntoIterator<Item = Service>, activator: A) -> DependencyResult<Self>
    where
        A: InstanceActivator + 'static,
    {
        let mut unique: Vec<Service> = Vec::new();
        for service in services {
            if !unique.contains(&service) {
                unique.push(service);
            }
        }

        if unique.is_empty() {
            return Err(DependencyError::invalid_argument(
                "services",
                format!("组件 {} 至少需要声明一个服务", activator.limit_type()),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            services: unique,
            activator: Arc::new(activator),
            lifetime: Lifetime::default(),
            metadata: HashMap::new(),
        })
    }

    /// 以激活器产生的类型作为唯一服务创建注册
    pub fn for_self<A>(activator: A) -> DependencyResult<Self>
    where
        A: InstanceActivator + 'static,
    {
        let service = Service::typed(activator.limit_type());
        Self::new([service], activator)
    }

    /// 设置生命周期
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// 添加元数据
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// 注册ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 注册声明的服务
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// 是否提供指定服务
    pub fn provides(&self, service: &Service) -> bool {
        self.services.contains(service)
    }

    /// 激活器
    pub fn activator(&self) -> &dyn InstanceActivator {
        self.activator.as_ref()
    }

    /// 生命周期
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// 元数据
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// 使用注册的激活器创建实例
    pub fn activate(
        &self,
        context: &dyn ComponentContext,
        parameters: &[Parameter],
    ) -> DependencyResult<AnyInstance> {
        self.activator.activate(context, parameters)
    }
}

impl fmt::Display for ComponentRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let services = self
            .services
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "Activator = {}, Services = [{}], Lifetime = {}",
            self.activator.limit_type(),
            services,
            self.lifetime
        )
    }
}

impl fmt::Debug for ComponentRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistration")
            .field("id", &self.id)
            .field("services", &self.services)
            .field("lifetime", &self.lifetime)
            .field("metadata", &self.metadata)
            .field("activator", &self.activator.limit_type().name)
            .finish()
    }
}
