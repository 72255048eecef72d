//! 自动生成工厂
//!
//! [`FactoryGenerator`] 针对一个委托形状只构建一次组合闭包：
//! `(作用域, 额外参数) -> 工厂委托`。生成的委托每次被调用时，
//! 都会把调用时的实参映射为依赖参数，再对捕获的作用域执行一次解析。

use di_abstractions::{
    AnyInstance, ComponentContext, ComponentRegistration, ContainerConfig, DelegateShape,
    FormalParameter, LifetimeScope, Parameter, ParameterMapping,
};
use infrastructure_common::{DependencyError, DependencyResult, Service, TypeInfo};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// 工厂产品的来源
#[derive(Debug, Clone)]
pub enum FactoryTarget {
    /// 解析固定服务
    Service(Service),
    /// 直接激活固定注册
    Registration(Arc<ComponentRegistration>),
}

type ProduceFn =
    dyn Fn(&dyn LifetimeScope, &[Parameter]) -> DependencyResult<AnyInstance> + Send + Sync;
type MapParametersFn = fn(&[FormalParameter], Vec<AnyInstance>) -> Vec<Parameter>;
type InvokeFn = dyn Fn(Vec<AnyInstance>) -> DependencyResult<AnyInstance> + Send + Sync;
type GenerateFn = dyn Fn(Arc<dyn LifetimeScope>, Arc<[Parameter]>) -> GeneratedFactory + Send + Sync;

/// 工厂生成器
///
/// 构造后无可变状态，可在多个线程间共享。
pub struct FactoryGenerator {
    shape: Arc<DelegateShape>,
    target: FactoryTarget,
    parameter_mapping: ParameterMapping,
    generator: Arc<GenerateFn>,
}

impl FactoryGenerator {
    /// 创建解析固定服务的工厂生成器
    pub fn for_service(
        shape: DelegateShape,
        service: Service,
        parameter_mapping: ParameterMapping,
    ) -> DependencyResult<Self> {
        Self::new(shape, FactoryTarget::Service(service), parameter_mapping)
    }

    /// 创建直接激活固定注册的工厂生成器
    pub fn for_registration(
        shape: DelegateShape,
        registration: Arc<ComponentRegistration>,
        parameter_mapping: ParameterMapping,
    ) -> DependencyResult<Self> {
        Self::new(
            shape,
            FactoryTarget::Registration(registration),
            parameter_mapping,
        )
    }

    /// 使用容器配置中的默认参数映射策略
    pub fn for_service_with_config(
        shape: DelegateShape,
        service: Service,
        config: &ContainerConfig,
    ) -> DependencyResult<Self> {
        Self::for_service(shape, service, config.default_parameter_mapping)
    }

    /// 使用容器配置中的默认参数映射策略
    pub fn for_registration_with_config(
        shape: DelegateShape,
        registration: Arc<ComponentRegistration>,
        config: &ContainerConfig,
    ) -> DependencyResult<Self> {
        Self::for_registration(shape, registration, config.default_parameter_mapping)
    }

    /// 创建工厂生成器
    ///
    /// 委托形状必须有返回类型，否则返回形状不匹配错误。
    pub fn new(
        shape: DelegateShape,
        target: FactoryTarget,
        parameter_mapping: ParameterMapping,
    ) -> DependencyResult<Self> {
        let product = shape.product_type()?;
        let effective = shape.effective_mapping(parameter_mapping);

        let produce: Arc<ProduceFn> = match &target {
            FactoryTarget::Service(service) => {
                let service = service.clone();
                Arc::new(move |scope: &dyn LifetimeScope, parameters: &[Parameter]| {
                    scope.resolve_service(&service, parameters)
                })
            }
            FactoryTarget::Registration(registration) => {
                let registration = Arc::clone(registration);
                Arc::new(move |scope: &dyn LifetimeScope, parameters: &[Parameter]| {
                    scope.resolve_registration(&registration, parameters)
                })
            }
        };

        let map_parameters: MapParametersFn = match effective {
            ParameterMapping::ByType => map_by_type,
            ParameterMapping::ByPosition => map_by_position,
            ParameterMapping::ByName | ParameterMapping::Adaptive => map_by_name,
        };

        let shape = Arc::new(shape);
        let generator_shape = Arc::clone(&shape);
        let generator: Arc<GenerateFn> = Arc::new(
            move |scope: Arc<dyn LifetimeScope>, extra_parameters: Arc<[Parameter]>| {
                let produce = Arc::clone(&produce);
                let invoke_shape = Arc::clone(&generator_shape);
                let invoker: Arc<InvokeFn> = Arc::new(
                    move |arguments: Vec<AnyInstance>| -> DependencyResult<AnyInstance> {
                        check_arguments(&invoke_shape, &arguments)?;
                        let parameters = map_parameters(invoke_shape.parameters(), arguments);
                        let instance = produce(&*scope, &parameters)?;
                        convert_product(instance, product, &invoke_shape)
                    },
                );

                GeneratedFactory {
                    shape: Arc::clone(&generator_shape),
                    extra_parameters,
                    invoker,
                }
            },
        );

        debug!(
            "构建工厂生成器: {}, 参数映射: {} -> {}",
            shape, parameter_mapping, effective
        );

        Ok(Self {
            shape,
            target,
            parameter_mapping: effective,
            generator,
        })
    }

    /// 委托形状
    pub fn shape(&self) -> &DelegateShape {
        &self.shape
    }

    /// 工厂产品的来源
    pub fn target(&self) -> &FactoryTarget {
        &self.target
    }

    /// 实际使用的参数映射策略
    pub fn parameter_mapping(&self) -> ParameterMapping {
        self.parameter_mapping
    }

    /// 生成绑定到上下文所在生命周期作用域的工厂委托
    pub fn generate_factory(
        &self,
        context: &dyn ComponentContext,
        parameters: &[Parameter],
    ) -> DependencyResult<GeneratedFactory> {
        let scope = context.lifetime_scope()?;
        Ok((self.generator)(scope, Arc::from(parameters)))
    }

    /// 生成工厂委托并转换为产品类型为 `T` 的类型化工厂
    pub fn generate_factory_as<T: Any + Send + Sync>(
        &self,
        context: &dyn ComponentContext,
        parameters: &[Parameter],
    ) -> DependencyResult<TypedFactory<T>> {
        self.generate_factory(context, parameters)?.typed::<T>()
    }
}

impl std::fmt::Debug for FactoryGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryGenerator")
            .field("shape", &self.shape.to_string())
            .field("target", &self.target)
            .field("parameter_mapping", &self.parameter_mapping)
            .finish_non_exhaustive()
    }
}

fn map_by_type(formals: &[FormalParameter], arguments: Vec<AnyInstance>) -> Vec<Parameter> {
    formals
        .iter()
        .zip(arguments)
        .map(|(formal, value)| Parameter::typed(formal.type_info, value))
        .collect()
}

fn map_by_position(formals: &[FormalParameter], arguments: Vec<AnyInstance>) -> Vec<Parameter> {
    formals
        .iter()
        .zip(arguments)
        .map(|(formal, value)| Parameter::positional(formal.position, value))
        .collect()
}

fn map_by_name(formals: &[FormalParameter], arguments: Vec<AnyInstance>) -> Vec<Parameter> {
    formals
        .iter()
        .zip(arguments)
        .map(|(formal, value)| Parameter::named(Arc::clone(&formal.name), value))
        .collect()
}

/// 校验实参个数和类型与形参一致
fn check_arguments(shape: &DelegateShape, arguments: &[AnyInstance]) -> DependencyResult<()> {
    let formals = shape.parameters();
    if formals.len() != arguments.len() {
        return Err(DependencyError::shape_mismatch(
            format!("{} 个实参 ({})", formals.len(), shape),
            format!("{} 个实参", arguments.len()),
        ));
    }

    for (formal, argument) in formals.iter().zip(arguments) {
        if (**argument).type_id() != formal.type_info.id {
            return Err(DependencyError::shape_mismatch(
                format!("{}: {}", formal.name, formal.type_info.name),
                format!("第 {} 个实参类型不同", formal.position + 1),
            ));
        }
    }

    Ok(())
}

/// 检查解析结果是委托声明的返回类型
fn convert_product(
    instance: AnyInstance,
    product: TypeInfo,
    shape: &DelegateShape,
) -> DependencyResult<AnyInstance> {
    if (*instance).type_id() == product.id {
        Ok(instance)
    } else {
        Err(DependencyError::shape_mismatch(
            product.name,
            format!("{} 的解析结果类型不同", shape),
        ))
    }
}

/// 生成的工厂委托
///
/// 闭包捕获生成时的作用域和额外参数；每次调用都使用调用时的实参重新解析。
#[derive(Clone)]
pub struct GeneratedFactory {
    shape: Arc<DelegateShape>,
    extra_parameters: Arc<[Parameter]>,
    invoker: Arc<InvokeFn>,
}

impl GeneratedFactory {
    /// 以装箱实参调用工厂
    pub fn invoke(&self, arguments: Vec<AnyInstance>) -> DependencyResult<AnyInstance> {
        (self.invoker)(arguments)
    }

    /// 委托形状
    pub fn shape(&self) -> &DelegateShape {
        &self.shape
    }

    /// 生成工厂时提供的额外参数
    pub fn extra_parameters(&self) -> &[Parameter] {
        &self.extra_parameters
    }

    /// 转换为产品类型为 `T` 的类型化工厂
    pub fn typed<T: Any + Send + Sync>(self) -> DependencyResult<TypedFactory<T>> {
        let requested = TypeInfo::of::<T>();
        if self.shape.return_type() == Some(requested) {
            Ok(TypedFactory {
                inner: self,
                product: PhantomData,
            })
        } else {
            Err(DependencyError::shape_mismatch(
                requested.name,
                self.shape.to_string(),
            ))
        }
    }
}

impl std::fmt::Debug for GeneratedFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedFactory")
            .field("shape", &self.shape.to_string())
            .field("extra_parameters", &self.extra_parameters)
            .finish_non_exhaustive()
    }
}

/// 类型化工厂委托
pub struct TypedFactory<T> {
    inner: GeneratedFactory,
    product: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> TypedFactory<T> {
    /// 调用工厂并返回具体类型的产品
    pub fn invoke(&self, arguments: Vec<AnyInstance>) -> DependencyResult<Arc<T>> {
        self.inner.invoke(arguments)?.downcast::<T>().map_err(|_| {
            DependencyError::shape_mismatch(std::any::type_name::<T>(), self.inner.shape.to_string())
        })
    }

    /// 未类型化的工厂委托
    pub fn untyped(&self) -> &GeneratedFactory {
        &self.inner
    }
}

impl<T> std::fmt::Debug for TypedFactory<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedFactory")
            .field("product", &std::any::type_name::<T>())
            .field("shape", &self.inner.shape.to_string())
            .finish_non_exhaustive()
    }
}

impl<T> Clone for TypedFactory<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            product: PhantomData,
        }
    }
}

/// 装箱一个工厂实参
pub fn argument<T: Any + Send + Sync>(value: T) -> AnyInstance {
    Arc::new(value)
}

/// 构造工厂实参列表
///
/// ```ignore
/// let widget = factory.invoke(factory_args![3_i32, String::from("blue")])?;
/// ```
#[macro_export]
macro_rules! factory_args {
    () => {
        ::std::vec::Vec::<::std::sync::Arc<dyn ::std::any::Any + Send + Sync>>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::argument($value)),+]
    };
}
