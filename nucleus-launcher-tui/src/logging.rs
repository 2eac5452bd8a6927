//! 파일 로깅: 터미널은 UI가 차지하므로 로그는 파일로만 기록
//!
//! - 실행 파일 옆 `nucleus-launcher-tui.log` (세션 시작 시 비움)
//! - `RUST_LOG`로 수준 조정, 기본 `info`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "nucleus-launcher-tui.log";

/// 로깅이 유지되는 동안 살아 있어야 하는 가드 (drop 시 flush)
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    pub path: PathBuf,
}

/// 로그 디렉터리 기본값: 실행 파일이 있는 디렉터리
pub fn default_log_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 파일 로거 초기화
pub fn init_logging(log_dir: &Path, verbose: bool) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;

    let path = log_dir.join(LOG_FILE_NAME);
    fs::write(&path, "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(false);

    let default = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
        path,
    })
}
