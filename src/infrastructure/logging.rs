//! 日志系统配置模块
//! 结构化日志（text / json），可选按天轮转的文件输出

use std::path::Path;

use anyhow::Result;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

use crate::config::LoggingConfig;

const DEFAULT_LOG_DIR: &str = "./logs";
const LOG_FILE_PREFIX: &str = "deployer.log";

/// 初始化日志系统
///
/// 启用文件日志时返回后台写线程的 guard，调用方需持有到进程退出，
/// 否则缓冲中的日志会丢失。
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    // RUST_LOG 优先，其次使用配置的级别
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_writer, guard) = if config.enable_file_logging {
        let log_dir = log_dir(config);
        std::fs::create_dir_all(log_dir)?;
        let (writer, guard) = non_blocking(rolling::daily(log_dir, LOG_FILE_PREFIX));
        (Some(writer), Some(guard))
    } else {
        (None, None)
    };

    if config.format == "json" {
        let file_layer = file_writer.map(|writer| {
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_timer(ChronoUtc::rfc_3339())
        });

        Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()))
            .with(file_layer)
            .try_init()?;
    } else {
        let file_layer = file_writer.map(|writer| {
            fmt::layer()
                .with_writer(writer)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
        });

        Registry::default()
            .with(filter)
            .with(
                fmt::layer()
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(true),
            )
            .with(file_layer)
            .try_init()?;
    }

    Ok(guard)
}

fn log_dir(config: &LoggingConfig) -> &Path {
    config
        .log_file_path
        .as_deref()
        .map(Path::new)
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new(DEFAULT_LOG_DIR))
}
