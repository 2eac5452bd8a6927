//! 클라이언트 실행
//!
//! 설치 루트의 실행 파일을 인자 없이 분리(detach)된 프로세스로 실행합니다.
//! 실행 후 대기하거나 감시하지 않습니다.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

/// 실행 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LaunchOutcome {
    /// 실행됨
    Launched { pid: u32 },
    /// 실행 파일 없음: 먼저 설치해야 함
    NotInstalled { path: PathBuf },
    /// 실행 실패
    Failed { reason: String },
}

impl LaunchOutcome {
    pub fn is_launched(&self) -> bool {
        matches!(self, LaunchOutcome::Launched { .. })
    }
}

/// 실행 파일이 있으면 실행
pub fn launch(executable: &Path) -> LaunchOutcome {
    if !executable.is_file() {
        tracing::warn!("[Launcher] Executable not found: {}", executable.display());
        return LaunchOutcome::NotInstalled { path: executable.to_path_buf() };
    }

    let mut cmd = Command::new(executable);
    if let Some(dir) = executable.parent() {
        cmd.current_dir(dir);
    }

    match spawn_detached(&mut cmd) {
        Ok(pid) => {
            tracing::info!("[Launcher] Started {} (pid {})", executable.display(), pid);
            LaunchOutcome::Launched { pid }
        }
        Err(e) => {
            tracing::error!("[Launcher] Failed to start {}: {}", executable.display(), e);
            LaunchOutcome::Failed { reason: e.to_string() }
        }
    }
}

/// 프로세스를 분리(detach)하여 실행: 부모 종료 후에도 유지
fn spawn_detached(cmd: &mut Command) -> std::io::Result<u32> {
    cmd.stdin(Stdio::null())
       .stdout(Stdio::null())
       .stderr(Stdio::null());

    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x00000008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
        cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let child = cmd.spawn()?;
    Ok(child.id())
}
