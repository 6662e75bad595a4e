use std::path::PathBuf;

use roomplan_config::{AppConfig, ConfigError, FrontendMode};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let mut args = std::env::args().skip(1);
    let mut override_mode: Option<FrontendMode> = None;
    let mut config_override: Option<PathBuf> = None;
    let mut plan_override: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => override_mode = Some(FrontendMode::Demo),
            "--interactive" => override_mode = Some(FrontendMode::Interactive),
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--plan" => {
                let Some(path) = args.next() else {
                    eprintln!("`--plan` 需要提供平面图文件路径");
                    std::process::exit(1);
                };
                plan_override = Some(PathBuf::from(path));
            }
            other => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
        }
    }

    let config = load_configuration(config_override);
    init_logging(&config);
    info!("启动房间布局校验应用");

    let mode = override_mode.unwrap_or(config.frontend.default_mode);
    let result = match mode {
        FrontendMode::Demo => {
            info!("以演示模式启动");
            roomplan_frontend::run_cli_demo(&config, plan_override.as_deref())
        }
        FrontendMode::Interactive => {
            info!("以交互模式启动");
            roomplan_frontend::run_cli_session(&config, plan_override.as_deref())
        }
    };
    if let Err(err) = result {
        error!(error = %err, "前端执行失败");
        std::process::exit(1);
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
