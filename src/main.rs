//! Nucleus 런처: 콘솔 모드
//!
//! 최신 버전을 확인하여 필요하면 설치/업데이트한 뒤 클라이언트를 실행합니다.
//! 진행 상황은 stdout, 로그는 stderr(`RUST_LOG`, `-v`)로 출력합니다.

mod console;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use nucleus_updater_lib::{check, config, version, UpdateManager, UpdateOutcome};
use tracing_subscriber::EnvFilter;

use console::ConsoleReporter;

#[derive(Parser)]
#[command(name = "nucleus-launcher")]
#[command(version, about = "Keep the Roblox client up to date and launch it", long_about = None)]
struct Cli {
    /// Configuration file (default: launcher.toml next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Installation root override
    #[arg(long, global = true)]
    install_root: Option<PathBuf>,

    /// Show per-package progress and info logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq, Debug)]
enum Command {
    /// Update if needed, then launch (default)
    Run,
    /// Update if needed without launching
    Update,
    /// Launch the installed client without checking for updates
    Launch,
    /// Compare installed and latest versions without installing
    Check {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show installation root and installed version
    Status,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    tracing::info!("[Launcher] Console mode starting");

    let mut cfg = config::load_config(cli.config.as_deref())?;
    if let Some(root) = cli.install_root {
        cfg.install_root = Some(root);
    }
    let manager = UpdateManager::new(cfg)?;
    tracing::info!("[Launcher] Installation root: {}", manager.layout().root().display());
    let reporter = ConsoleReporter::new(cli.verbose);

    let code = match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let outcome = manager.run(&reporter).await;
            if let UpdateOutcome::Updated { report } = &outcome.update {
                println!("{}", console::report_summary(report));
            }
            console::launch_exit_code(outcome.launch.as_ref())
        }
        Command::Update => {
            let outcome = manager.update(&reporter).await;
            if let UpdateOutcome::Updated { report } = &outcome {
                println!("{}", console::report_summary(report));
            }
            console::update_exit_code(&outcome)
        }
        Command::Launch => {
            let outcome = manager.launch(&reporter);
            console::launch_exit_code(Some(&outcome))
        }
        Command::Check { json } => {
            let result = check::check_once(&manager).await;
            if json {
                println!("{}", check::result_to_json(&result));
            } else {
                println!("{}", result.summary());
            }
            check::exit_code(&result)
        }
        Command::Status => {
            let layout = manager.layout();
            println!("Installation root: {}", layout.root().display());
            println!(
                "Installed version: {}",
                version::display_version(manager.installed_version().as_deref())
            );
            println!(
                "Executable:        {} ({})",
                layout.executable_path().display(),
                if manager.is_installed() { "present" } else { "missing" }
            );
            0
        }
    };

    process::exit(code);
}
