//! 容器配置加载
//!
//! 从配置文件的 `[container]` 节读取 [`ContainerConfig`]，
//! 再以 `DI_` 前缀的环境变量覆盖，例如
//! `DI_CONTAINER__DEFAULT_PARAMETER_MAPPING=by_position`。

use di_abstractions::ContainerConfig;
use infrastructure_common::{ConfigError, ConfigResult};
use std::path::Path;
use tracing::{debug, error};

/// 配置文件中的容器配置节
pub const CONTAINER_SECTION: &str = "container";

/// 加载容器配置
///
/// 未提供文件时只读取环境变量；配置中没有容器节时使用默认值。
pub fn load_container_config(path: Option<&Path>) -> ConfigResult<ContainerConfig> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        debug!("加载容器配置文件: {}", path.display());
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("DI")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| {
            error!("容器配置构建失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

    match settings.get::<ContainerConfig>(CONTAINER_SECTION) {
        Ok(config) => {
            debug!("容器配置加载成功: {:?}", config);
            Ok(config)
        }
        Err(config::ConfigError::NotFound(_)) => {
            debug!("未找到容器配置节，使用默认配置");
            Ok(ContainerConfig::default())
        }
        Err(e) => {
            error!("容器配置绑定失败: {}", e);
            Err(ConfigError::ParseError {
                source: Box::new(e),
            })
        }
    }
}
