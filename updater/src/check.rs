//! 원샷 버전 체크
//!
//! 설치하지 않고 최신 버전만 확인합니다.
//! `nucleus-launcher check --json` 출력과 종료 코드에 사용됩니다.

use serde::{Deserialize, Serialize};

use super::UpdateManager;
use crate::version;

/// 원샷 체크 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    /// 설치된 버전 (미설치면 None)
    pub installed_version: Option<String>,
    /// 서버 최신 버전 (조회 실패 시 None)
    pub latest_version: Option<String>,
    pub update_available: bool,
    /// 오류 메시지 (있으면)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: String,
}

impl CheckResult {
    /// 사람이 읽는 요약
    pub fn summary(&self) -> String {
        let installed = version::display_version(self.installed_version.as_deref());
        match (&self.error, &self.latest_version) {
            (Some(e), _) => format!("Version check failed: {}", e),
            (None, Some(latest)) if self.update_available => {
                format!("Update available: {} -> {}", installed, latest)
            }
            (None, Some(latest)) => format!("Up to date (v{})", latest),
            (None, None) => format!("Installed version: {}", installed),
        }
    }
}

/// 한 번 체크하고 결과를 반환
pub async fn check_once(manager: &UpdateManager) -> CheckResult {
    tracing::info!("[Updater] Running one-shot version check");
    let checked_at = chrono::Utc::now().to_rfc3339();

    match manager.check().await {
        Ok(check) => {
            if check.update_available {
                tracing::info!(
                    "[Updater] Update available: {} -> {}",
                    version::display_version(check.installed.as_deref()),
                    check.latest
                );
            } else {
                tracing::info!("[Updater] Up to date (v{})", check.latest);
            }
            CheckResult {
                installed_version: check.installed,
                latest_version: Some(check.latest),
                update_available: check.update_available,
                error: None,
                checked_at,
            }
        }
        Err(e) => {
            tracing::error!("[Updater] Check failed: {}", e);
            CheckResult {
                installed_version: manager.installed_version(),
                latest_version: None,
                update_available: false,
                error: Some(e.to_string()),
                checked_at,
            }
        }
    }
}

/// 체크 결과를 JSON 문자열로 직렬화
pub fn result_to_json(result: &CheckResult) -> String {
    serde_json::to_string(result).unwrap_or_else(|_| "{}".to_string())
}

/// 프로세스 종료 코드 결정
///
/// - `0`: 업데이트 있음
/// - `1`: 체크 실패
/// - `2`: 최신 상태
pub fn exit_code(result: &CheckResult) -> i32 {
    if result.error.is_some() {
        1
    } else if result.update_available {
        0
    } else {
        2
    }
}
