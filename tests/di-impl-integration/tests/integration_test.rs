//! di-impl 集成测试：注册表、注册源、生命周期作用域与工厂生成器协同工作
use di_abstractions::{
    deferred_source, registered_observer, ComponentContext, ComponentContextExt,
    ComponentRegistration, ComponentRegistry, DelegateActivator, DelegateShape,
    DynamicRegistrationSource, LifetimeScope, Parameter, ParameterMapping,
    ProvidedInstanceActivator, RegisteredProbe,
};
use di_impl::{
    factory_args, load_container_config, ComponentRegistryImpl, FactoryGenerator,
    RegistryLifetimeScope,
};
use infrastructure_common::{DependencyResult, Lifetime, Service, TypeInfo};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Debug, PartialEq)]
struct Widget {
    size: i32,
    color: String,
}

trait Greeter: Send + Sync {
    fn greet(&self, who: &str) -> String;
}

struct PoliteGreeter;

impl Greeter for PoliteGreeter {
    fn greet(&self, who: &str) -> String {
        format!("Good day, {}", who)
    }
}

/// 为 `setting:<key>` 形式的命名字符串服务提供注册
struct SettingsSource {
    queries: AtomicUsize,
}

impl DynamicRegistrationSource for SettingsSource {
    fn try_registration(
        &self,
        service: &Service,
        _is_registered: RegisteredProbe<'_>,
    ) -> DependencyResult<Option<ComponentRegistration>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let key = match service.name().and_then(|name| name.strip_prefix("setting:")) {
            Some(key) if service.type_info().is::<String>() => key.to_string(),
            _ => return Ok(None),
        };

        let registration = ComponentRegistration::new(
            [service.clone()],
            ProvidedInstanceActivator::new(format!("value of {}", key)),
        )?
        .with_lifetime(Lifetime::Singleton);
        Ok(Some(registration))
    }
}

/// 仅当 Widget 已注册时才提供 `Vec<Widget>` 的注册
struct WidgetListSource;

impl DynamicRegistrationSource for WidgetListSource {
    fn try_registration(
        &self,
        service: &Service,
        is_registered: RegisteredProbe<'_>,
    ) -> DependencyResult<Option<ComponentRegistration>> {
        if !service.type_info().is::<Vec<Widget>>() || !is_registered(&Service::of::<Widget>())? {
            return Ok(None);
        }

        let registration = ComponentRegistration::for_self(DelegateActivator::new(
            |context: &dyn ComponentContext, _parameters: &[Parameter]| {
                let widget = context.resolve::<Widget>()?;
                Ok(vec![Widget {
                    size: widget.size,
                    color: widget.color.clone(),
                }])
            },
        ))?;
        Ok(Some(registration))
    }
}

fn widget_registration() -> anyhow::Result<ComponentRegistration> {
    Ok(ComponentRegistration::for_self(DelegateActivator::new(
        |_context: &dyn ComponentContext, parameters: &[Parameter]| {
            let size = Parameter::find_named(parameters, "size")
                .and_then(|p| p.value_as::<i32>())
                .copied()
                .unwrap_or(1);
            let color = Parameter::find_named(parameters, "color")
                .and_then(|p| p.value_as::<String>())
                .cloned()
                .unwrap_or_else(|| "grey".to_string());
            Ok(Widget { size, color })
        },
    ))?)
}

fn widget_factory_shape() -> DelegateShape {
    DelegateShape::custom::<Widget>("WidgetFactory")
        .with_parameter::<i32>("size")
        .with_parameter::<String>("color")
}

#[test]
fn test_generated_factory_resolves_through_registry() -> anyhow::Result<()> {
    init_test_logger();
    let registry = Arc::new(ComponentRegistryImpl::new());
    registry.register(Arc::new(widget_registration()?))?;
    let scope = RegistryLifetimeScope::new(registry);

    let generator = FactoryGenerator::for_service(
        widget_factory_shape(),
        Service::of::<Widget>(),
        ParameterMapping::Adaptive,
    )?;
    let factory = generator.generate_factory_as::<Widget>(&*scope, &[])?;

    let first = factory.invoke(factory_args![3_i32, String::from("red")])?;
    let second = factory.invoke(factory_args![5_i32, String::from("blue")])?;

    assert_eq!(*first, Widget { size: 3, color: "red".to_string() });
    assert_eq!(*second, Widget { size: 5, color: "blue".to_string() });
    Ok(())
}

#[test]
fn test_producer_shape_maps_by_type() -> anyhow::Result<()> {
    init_test_logger();
    let registry = Arc::new(ComponentRegistryImpl::new());
    let registration = ComponentRegistration::for_self(DelegateActivator::new(
        |_context: &dyn ComponentContext, parameters: &[Parameter]| {
            let size = Parameter::find_typed(parameters, TypeInfo::of::<i32>())
                .and_then(|p| p.value_as::<i32>())
                .copied()
                .unwrap_or_default();
            Ok(Widget { size, color: "typed".to_string() })
        },
    ))?;
    registry.register(Arc::new(registration))?;
    let scope = RegistryLifetimeScope::new(registry);

    let shape = DelegateShape::producer::<Widget>().with_argument::<i32>();
    let generator =
        FactoryGenerator::for_service(shape, Service::of::<Widget>(), ParameterMapping::Adaptive)?;
    assert_eq!(generator.parameter_mapping(), ParameterMapping::ByType);

    let factory = generator.generate_factory_as::<Widget>(&*scope, &[])?;
    assert_eq!(factory.invoke(factory_args![8_i32])?.size, 8);
    Ok(())
}

#[test]
fn test_factory_sees_registrations_added_after_generation() -> anyhow::Result<()> {
    init_test_logger();
    let registry = Arc::new(ComponentRegistryImpl::new());
    let scope = RegistryLifetimeScope::new(Arc::clone(&registry) as Arc<dyn ComponentRegistry>);
    let generator = FactoryGenerator::for_service(
        DelegateShape::producer::<Widget>(),
        Service::of::<Widget>(),
        ParameterMapping::Adaptive,
    )?;
    let factory = generator.generate_factory_as::<Widget>(&*scope, &[])?;

    assert!(factory.invoke(factory_args![]).is_err());

    registry.register(Arc::new(widget_registration()?))?;
    assert_eq!(factory.invoke(factory_args![])?.color, "grey");
    Ok(())
}

#[test]
fn test_dynamic_source_supplies_keyed_services() -> anyhow::Result<()> {
    init_test_logger();
    let registry = Arc::new(ComponentRegistryImpl::new());
    let source = Arc::new(SettingsSource {
        queries: AtomicUsize::new(0),
    });
    registry.add_dynamic_source(Arc::clone(&source) as Arc<dyn DynamicRegistrationSource>);
    let scope = RegistryLifetimeScope::new(Arc::clone(&registry) as Arc<dyn ComponentRegistry>);

    let timeout = scope.resolve_named::<String>("setting:timeout")?;
    assert_eq!(*timeout, "value of timeout");
    scope.resolve_named::<String>("setting:timeout")?;
    assert_eq!(source.queries.load(Ordering::SeqCst), 1);

    assert!(scope.resolve::<Widget>().is_err());
    assert!(scope.resolve::<Widget>().is_err());
    assert_eq!(source.queries.load(Ordering::SeqCst), 2);

    let registration = registry
        .try_get_registration(&Service::named::<String>("setting:timeout")?)?
        .ok_or_else(|| anyhow::anyhow!("动态注册未保存"))?;
    assert_eq!(registration.lifetime(), Lifetime::Singleton);
    Ok(())
}

#[test]
fn test_dynamic_source_can_probe_other_services() -> anyhow::Result<()> {
    init_test_logger();
    let registry = Arc::new(ComponentRegistryImpl::new());
    registry.add_dynamic_source(Arc::new(WidgetListSource));

    assert!(!registry.is_registered(&Service::of::<Vec<Widget>>())?);

    registry.add_deferred_source(deferred_source(|| {
        widget_registration().map_err(|err| {
            infrastructure_common::DependencyError::source_failed("widgets", err.to_string())
        })
    }));
    // 延迟注册源不会清空否定缓存，添加动态源才会
    assert!(!registry.is_registered(&Service::of::<Vec<Widget>>())?);
    registry.add_dynamic_source(Arc::new(WidgetListSource));
    assert!(registry.is_registered(&Service::of::<Vec<Widget>>())?);

    let scope = RegistryLifetimeScope::new(registry);
    let widgets = scope.resolve::<Vec<Widget>>()?;
    assert_eq!(widgets.len(), 1);
    assert_eq!(widgets[0].color, "grey");
    Ok(())
}

#[test]
fn test_observer_may_register_from_callback() -> anyhow::Result<()> {
    init_test_logger();
    let registry = Arc::new(ComponentRegistryImpl::new());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&seen);
    registry.on_registered(registered_observer(move |registry, registration| {
        log.lock().unwrap_or_else(|e| e.into_inner()).push(registration.to_string());
        if registration.provides(&Service::of::<Widget>()) {
            registry.register(Arc::new(ComponentRegistration::for_self(
                ProvidedInstanceActivator::new(String::from("follow-up")),
            )?))?;
        }
        Ok(())
    }));

    registry.register(Arc::new(widget_registration()?))?;

    assert!(registry.is_registered(&Service::of::<String>())?);
    assert_eq!(registry.registration_count(), 2);
    assert_eq!(seen.lock().unwrap_or_else(|e| e.into_inner()).len(), 2);
    Ok(())
}

#[test]
fn test_trait_object_service() -> anyhow::Result<()> {
    init_test_logger();
    let registry = Arc::new(ComponentRegistryImpl::new());
    let greeter: Arc<dyn Greeter> = Arc::new(PoliteGreeter);
    registry.register(Arc::new(ComponentRegistration::for_self(
        ProvidedInstanceActivator::new(greeter),
    )?))?;
    let scope = RegistryLifetimeScope::new(registry);

    let greeter = scope.resolve::<Arc<dyn Greeter>>()?;
    assert_eq!(greeter.greet("Ada"), "Good day, Ada");
    Ok(())
}

#[test]
fn test_configured_defaults_drive_registry_and_generator() -> anyhow::Result<()> {
    init_test_logger();
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(file, "[container]")?;
    writeln!(file, "default_parameter_mapping = \"by_position\"")?;
    writeln!(file, "cache_unregistered_services = false")?;
    file.flush()?;

    let config = load_container_config(Some(file.path()))?;
    let registry = Arc::new(ComponentRegistryImpl::with_config(config.clone()));
    let source = Arc::new(SettingsSource {
        queries: AtomicUsize::new(0),
    });
    registry.add_dynamic_source(Arc::clone(&source) as Arc<dyn DynamicRegistrationSource>);

    assert!(!registry.is_registered(&Service::of::<Widget>())?);
    assert!(!registry.is_registered(&Service::of::<Widget>())?);
    assert_eq!(source.queries.load(Ordering::SeqCst), 2);

    let generator = FactoryGenerator::for_service_with_config(
        widget_factory_shape(),
        Service::of::<Widget>(),
        &config,
    )?;
    assert_eq!(generator.parameter_mapping(), ParameterMapping::ByPosition);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_factory_invocations() -> anyhow::Result<()> {
    init_test_logger();
    let registry = Arc::new(ComponentRegistryImpl::new());
    registry.register(Arc::new(widget_registration()?))?;
    let scope = RegistryLifetimeScope::new(Arc::clone(&registry) as Arc<dyn ComponentRegistry>);

    let generator = FactoryGenerator::for_service(
        widget_factory_shape(),
        Service::of::<Widget>(),
        ParameterMapping::ByName,
    )?;
    let factory = generator.generate_factory_as::<Widget>(&*scope, &[])?;

    let mut handles = Vec::new();
    for i in 0..16_i32 {
        let factory = factory.clone();
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            let widget = factory.invoke(factory_args![i, format!("color-{}", i)])?;
            let lookup = registry.try_get_registration(&Service::of::<Widget>())?;
            anyhow::ensure!(lookup.is_some(), "Widget 注册丢失");
            anyhow::ensure!(widget.size == i && widget.color == format!("color-{}", i));
            Ok::<_, anyhow::Error>(())
        }));
    }

    for handle in handles {
        handle.await??;
    }
    assert_eq!(registry.registration_count(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_and_lookup() -> anyhow::Result<()> {
    init_test_logger();
    let registry = Arc::new(ComponentRegistryImpl::new());
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    registry.on_registered(registered_observer(move |_registry, _registration| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    let mut handles = Vec::new();
    for i in 0..8_usize {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            let service = Service::named::<String>(format!("item-{}", i))?;
            let registration = ComponentRegistration::new(
                [service.clone()],
                ProvidedInstanceActivator::new(format!("item {}", i)),
            )?;
            registry.register(Arc::new(registration))?;
            anyhow::ensure!(registry.is_registered(&service)?);
            Ok::<_, anyhow::Error>(())
        }));
    }

    for handle in handles {
        handle.await??;
    }
    assert_eq!(registry.registration_count(), 8);
    assert_eq!(notified.load(Ordering::SeqCst), 8);

    let scope = RegistryLifetimeScope::new(registry);
    assert_eq!(scope.scope().name, "root");
    assert_eq!(*scope.resolve_named::<String>("item-3")?, "item 3");
    Ok(())
}
