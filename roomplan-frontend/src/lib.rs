pub mod cli;
pub mod errors;
pub mod loader;
pub mod render;

use std::io;
use std::path::Path;

use errors::FrontendError;
use roomplan_config::AppConfig;
use tracing::info;

/// 启动 CLI 演示或返回错误。
pub fn run_cli_demo(config: &AppConfig, plan_path: Option<&Path>) -> Result<(), FrontendError> {
    info!("启动 CLI 演示前端");
    let loaded = loader::load_scene(config, plan_path);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli::run_demo(loaded, &mut out)?;
    Ok(())
}

/// 从标准输入读取命令的交互会话。
pub fn run_cli_session(config: &AppConfig, plan_path: Option<&Path>) -> Result<(), FrontendError> {
    info!("启动交互会话");
    let loaded = loader::load_scene(config, plan_path);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    cli::run_session(loaded.scene, stdin.lock(), &mut out)?;
    Ok(())
}
