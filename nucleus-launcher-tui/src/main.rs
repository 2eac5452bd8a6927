//! Nucleus 런처: 창 모드
//!
//! 버전 표시, 진행률 게이지, 로그 영역을 가진 터미널 창입니다.
//! 업데이트/실행은 백그라운드 워커에서 처리됩니다.

mod logging;
mod tui;

use std::path::PathBuf;

use clap::Parser;
use nucleus_updater_lib::{config, UpdateManager};

#[derive(Parser)]
#[command(name = "nucleus-launcher-tui")]
#[command(version, about = "Nucleus launcher window", long_about = None)]
struct Cli {
    /// Configuration file (default: launcher.toml next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Installation root override
    #[arg(long)]
    install_root: Option<PathBuf>,

    /// Directory for nucleus-launcher-tui.log (default: next to the executable)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_dir = cli.log_dir.unwrap_or_else(logging::default_log_dir);
    let guard = logging::init_logging(&log_dir, cli.verbose)?;
    tracing::info!("[Launcher] Window mode starting");

    let mut cfg = config::load_config(cli.config.as_deref())?;
    if let Some(root) = cli.install_root {
        cfg.install_root = Some(root);
    }
    let manager = UpdateManager::new(cfg)?;

    tui::run(manager, &guard.path).await
}
