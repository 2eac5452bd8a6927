//! # Nucleus 런처 업데이터 라이브러리
//!
//! 최신 클라이언트 버전을 조회하고, 설치된 버전과 다르면 설치 루트를 정리한 뒤
//! 매니페스트에 나열된 패키지를 내려받아 정해진 디렉터리 구조로 풀고,
//! 마지막으로 클라이언트를 실행합니다.
//!
//! ## 동작 순서
//! ```text
//! CheckVersion ─┬─ UpToDate ───────────────────────────────────────────────┬─ Launch
//!               └─ Stale → Clean → FetchAll → WriteSettings → RecordVersion ┘
//! ```
//! - 버전 조회 실패 시 업데이트를 중단하며 설치 상태는 건드리지 않습니다.
//! - 패키지 단위 실패는 기록하고 다음 패키지로 진행합니다 (재시도 없음).
//! - 모든 패키지가 성공했을 때만 버전 기록을 갱신합니다
//!   (`advance_marker_on_partial_failure`로 변경 가능).
//!
//! ## 모듈
//! - **config.rs**: `launcher.toml` 설정
//! - **cdn.rs**: 버전 조회 / 스트리밍 다운로드
//! - **manifest.rs**: 매니페스트 파싱, 대체 목록
//! - **layout.rs**: 설치 루트 구조, 정리, 압축 해제, AppSettings.xml
//! - **version.rs**: 설치 버전 기록
//! - **launcher.rs**: 클라이언트 실행
//! - **check.rs**: 원샷 버전 체크 (`check --json`)
//! - **worker.rs**: 창 모드용 백그라운드 워커

pub mod cdn;
pub mod check;
pub mod config;
pub mod error;
pub mod launcher;
pub mod layout;
pub mod manifest;
pub mod version;
pub mod worker;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use check::CheckResult;
pub use config::LauncherConfig;
pub use error::UpdaterError;
pub use launcher::LaunchOutcome;
pub use layout::{CleanReport, ExtractionMap, InstallLayout};
pub use manifest::ManifestSource;
pub use version::VersionStore;
pub use worker::{BackgroundTask, BackgroundWorker, WorkerEvent, WorkerStatus};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use cdn::DeployClient;

// ══════════════════════════════════════════════════════
// 진행 이벤트
// ══════════════════════════════════════════════════════

/// 이벤트 수준 (콘솔 접두사/창 색상 결정)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// 업데이트/실행 중 발생하는 진행 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UpdateEvent {
    /// 최신 버전 조회 시작
    CheckStarted,
    /// 설치 버전과 최신 버전 확인됨
    VersionResolved { installed: Option<String>, latest: String },
    /// 최신 버전 조회 실패: 업데이트 중단
    CheckFailed { error: String },
    /// 이미 최신
    UpToDate { version: String },
    /// 설치 루트 정리 시작
    Cleaning,
    /// 정리 중 개별 항목 삭제 실패
    CleanFailed { entry: String, error: String },
    /// 매니페스트 다운로드 시작
    ManifestDownloading,
    /// 패키지 목록 확정
    ManifestLoaded { packages: usize, source: ManifestSource },
    /// 패키지 처리 시작 (index는 1부터)
    PackageStarted { package: String, index: usize, total: usize },
    /// 패키지 설치 완료
    PackageInstalled { package: String, index: usize, total: usize },
    /// 패키지 실패: 다음 패키지로 진행
    PackageFailed { package: String, index: usize, total: usize, error: String },
    /// AppSettings.xml 작성
    WritingSettings,
    SettingsFailed { error: String },
    /// 버전 기록 갱신됨
    VersionRecorded { version: String },
    /// 실패한 패키지가 있어 버전 기록을 갱신하지 않음
    VersionWithheld { version: String, failed: usize },
    /// 클라이언트 실행 결과
    LaunchFinished { outcome: LaunchOutcome },
}

impl UpdateEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            UpdateEvent::UpToDate { .. } | UpdateEvent::VersionRecorded { .. } => EventLevel::Success,
            UpdateEvent::LaunchFinished { outcome } if outcome.is_launched() => EventLevel::Success,
            UpdateEvent::ManifestLoaded { source: ManifestSource::Fallback { .. }, .. }
            | UpdateEvent::CleanFailed { .. }
            | UpdateEvent::VersionWithheld { .. } => EventLevel::Warning,
            UpdateEvent::CheckFailed { .. }
            | UpdateEvent::PackageFailed { .. }
            | UpdateEvent::SettingsFailed { .. }
            | UpdateEvent::LaunchFinished { .. } => EventLevel::Error,
            _ => EventLevel::Info,
        }
    }

    /// 사람이 읽는 한 줄 메시지
    pub fn message(&self) -> String {
        match self {
            UpdateEvent::CheckStarted => "Checking latest Roblox version...".to_string(),
            UpdateEvent::VersionResolved { installed, latest } => format!(
                "Installed version: {}, server version: {}",
                version::display_version(installed.as_deref()),
                latest
            ),
            UpdateEvent::CheckFailed { error } => format!("Could not fetch latest Roblox version: {}", error),
            UpdateEvent::UpToDate { version } => format!("Roblox is already up to date (v{})", version),
            UpdateEvent::Cleaning => "Cleaning installation directory...".to_string(),
            UpdateEvent::CleanFailed { entry, error } => format!("Error removing {}: {}", entry, error),
            UpdateEvent::ManifestDownloading => "Downloading manifest...".to_string(),
            UpdateEvent::ManifestLoaded { packages, source: ManifestSource::Remote } => {
                format!("Manifest lists {} package(s)", packages)
            }
            UpdateEvent::ManifestLoaded { packages, source: ManifestSource::Fallback { reason } } => format!(
                "Failed to download manifest ({}); using built-in list of {} package(s)",
                reason, packages
            ),
            UpdateEvent::PackageStarted { package, index, total } => {
                format!("Downloading {} ({}/{})...", package, index, total)
            }
            UpdateEvent::PackageInstalled { package, .. } => format!("Installed {}", package),
            UpdateEvent::PackageFailed { package, error, .. } => format!("Error with {}: {}", package, error),
            UpdateEvent::WritingSettings => "Creating AppSettings.xml...".to_string(),
            UpdateEvent::SettingsFailed { error } => format!("Could not write AppSettings.xml: {}", error),
            UpdateEvent::VersionRecorded { version } => format!("Roblox updated to v{}", version),
            UpdateEvent::VersionWithheld { version, failed } => format!(
                "{} package(s) failed; v{} not recorded so the next run retries the update",
                failed, version
            ),
            UpdateEvent::LaunchFinished { outcome } => match outcome {
                LaunchOutcome::Launched { .. } => "Roblox launched.".to_string(),
                LaunchOutcome::NotInstalled { .. } => {
                    "Roblox is not installed. Please run the updater first.".to_string()
                }
                LaunchOutcome::Failed { reason } => format!("Failed to launch Roblox: {}", reason),
            },
        }
    }

    /// 패키지 진행률 (완료 수, 전체 수)
    pub fn progress(&self) -> Option<(usize, usize)> {
        match self {
            UpdateEvent::ManifestLoaded { packages, .. } => Some((0, *packages)),
            UpdateEvent::PackageInstalled { index, total, .. }
            | UpdateEvent::PackageFailed { index, total, .. } => Some((*index, *total)),
            _ => None,
        }
    }
}

/// 진행 상황 수신 인터페이스 (콘솔 출력, 워커 채널, 테스트 수집기)
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: UpdateEvent);
}

/// 이벤트를 버림
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: UpdateEvent) {}
}

/// 이벤트를 순서대로 보관 (테스트/진단용)
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<UpdateEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<UpdateEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: UpdateEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

// ══════════════════════════════════════════════════════
// 결과 타입
// ══════════════════════════════════════════════════════

/// 패키지 처리 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PackageStatus {
    Installed { destination: PathBuf },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageResult {
    pub package: String,
    #[serde(flatten)]
    pub status: PackageStatus,
}

impl PackageResult {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, PackageStatus::Installed { .. })
    }
}

/// 설치 패스 한 번의 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateReport {
    /// 설치 전 기록된 버전
    pub previous_version: Option<String>,
    /// 설치 대상 버전
    pub version: String,
    pub manifest_source: ManifestSource,
    pub clean: CleanReport,
    pub packages: Vec<PackageResult>,
    pub settings_written: bool,
    /// 버전 기록이 갱신되었는지
    pub marker_advanced: bool,
    pub finished_at: String,
}

impl UpdateReport {
    pub fn failed_packages(&self) -> impl Iterator<Item = &PackageResult> {
        self.packages.iter().filter(|p| !p.is_ok())
    }

    pub fn failed_count(&self) -> usize {
        self.failed_packages().count()
    }

    /// 모든 패키지 설치와 설정 파일 작성이 성공했는지
    pub fn is_complete(&self) -> bool {
        self.settings_written && self.failed_count() == 0
    }
}

/// 업데이트 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum UpdateOutcome {
    UpToDate { version: String },
    Updated { report: UpdateReport },
    /// 최신 버전을 알 수 없어 중단
    Aborted { error: UpdaterError },
}

/// 버전 비교 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionCheck {
    pub installed: Option<String>,
    pub latest: String,
    pub update_available: bool,
}

/// 전체 실행(업데이트 + 실행) 결과
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub update: UpdateOutcome,
    /// 업데이트가 중단되면 실행하지 않으므로 None
    pub launch: Option<LaunchOutcome>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.launch.as_ref().map(LaunchOutcome::is_launched).unwrap_or(false)
    }
}

// ══════════════════════════════════════════════════════
// UpdateManager
// ══════════════════════════════════════════════════════

/// 버전 확인 · 설치 · 실행을 담당하는 업데이트 엔진
///
/// 콘솔과 창 모드가 같은 인스턴스 로직을 공유하며,
/// 진행 상황은 [`ProgressReporter`]로만 전달합니다.
pub struct UpdateManager {
    config: LauncherConfig,
    layout: InstallLayout,
    store: VersionStore,
    client: DeployClient,
}

impl UpdateManager {
    /// 설정을 검증하고 설치 루트/다운로드 캐시를 생성
    pub fn new(config: LauncherConfig) -> Result<Self, UpdaterError> {
        config.validate()?;
        let layout = InstallLayout::from_config(&config);
        layout.ensure()?;
        let store = VersionStore::new(layout.marker_path());
        let client = DeployClient::new(&config)?;

        tracing::info!("[Updater] Installation root: {}", layout.root().display());

        Ok(Self {
            config,
            layout,
            store,
            client,
        })
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// 설치된 버전 (미설치면 None)
    pub fn installed_version(&self) -> Option<String> {
        self.store.read()
    }

    /// 클라이언트 실행 파일이 있는지
    pub fn is_installed(&self) -> bool {
        self.layout.executable_path().is_file()
    }

    // ─── 버전 확인 ────────────────────────────────────────────────────────

    /// 최신 버전을 조회하여 설치 버전과 비교
    pub async fn check(&self) -> Result<VersionCheck, UpdaterError> {
        let latest = self.client.fetch_latest_version().await?;
        let installed = self.store.read();
        let update_available = !self.store.is_current(&latest);
        Ok(VersionCheck {
            installed,
            latest,
            update_available,
        })
    }

    /// 버전을 확인하고 필요하면 설치 패스를 수행
    pub async fn update(&self, reporter: &dyn ProgressReporter) -> UpdateOutcome {
        reporter.report(UpdateEvent::CheckStarted);

        let check = match self.check().await {
            Ok(check) => check,
            Err(error) => {
                tracing::error!("[Updater] Failed to fetch latest version: {}", error);
                reporter.report(UpdateEvent::CheckFailed { error: error.to_string() });
                return UpdateOutcome::Aborted { error };
            }
        };

        reporter.report(UpdateEvent::VersionResolved {
            installed: check.installed.clone(),
            latest: check.latest.clone(),
        });

        if !check.update_available {
            tracing::info!("[Updater] Already up to date (v{})", check.latest);
            reporter.report(UpdateEvent::UpToDate { version: check.latest.clone() });
            return UpdateOutcome::UpToDate { version: check.latest };
        }

        let report = self.install_version(&check.latest, reporter).await;
        UpdateOutcome::Updated { report }
    }

    // ─── 설치 ────────────────────────────────────────────────────────

    /// 지정 버전 설치: 정리 → 패키지 설치 → 설정 파일 → 버전 기록
    pub async fn install_version(&self, version: &str, reporter: &dyn ProgressReporter) -> UpdateReport {
        let previous_version = self.store.read();
        tracing::info!(
            "[Installer] Installing v{} (installed: {})",
            version,
            version::display_version(previous_version.as_deref())
        );

        // 1. 정리
        reporter.report(UpdateEvent::Cleaning);
        let layout = self.layout.clone();
        let clean = match tokio::task::spawn_blocking(move || layout.clean()).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("[Installer] Clean task failed: {}", e);
                CleanReport {
                    failed: vec![(self.layout.root().display().to_string(), e.to_string())],
                    ..Default::default()
                }
            }
        };
        for (entry, error) in &clean.failed {
            reporter.report(UpdateEvent::CleanFailed {
                entry: entry.clone(),
                error: error.clone(),
            });
        }
        if let Err(e) = self.layout.ensure() {
            tracing::error!("[Installer] {}", e);
        }

        // 2. 패키지 목록
        let (packages, manifest_source) = self.resolve_packages(version, reporter).await;

        // 3. 순차 설치 (실패해도 계속)
        let total = packages.len();
        let mut results = Vec::with_capacity(total);
        for (i, package) in packages.iter().enumerate() {
            let index = i + 1;
            reporter.report(UpdateEvent::PackageStarted {
                package: package.clone(),
                index,
                total,
            });
            tracing::info!("[Installer] ({}/{}) {}", index, total, package);

            match self.install_package(version, package).await {
                Ok(destination) => {
                    reporter.report(UpdateEvent::PackageInstalled {
                        package: package.clone(),
                        index,
                        total,
                    });
                    results.push(PackageResult {
                        package: package.clone(),
                        status: PackageStatus::Installed { destination },
                    });
                }
                Err(e) => {
                    tracing::error!("[Installer] Error with {}: {}", package, e);
                    reporter.report(UpdateEvent::PackageFailed {
                        package: package.clone(),
                        index,
                        total,
                        error: e.to_string(),
                    });
                    results.push(PackageResult {
                        package: package.clone(),
                        status: PackageStatus::Failed { reason: e.to_string() },
                    });
                }
            }
        }

        // 4. 설정 파일
        reporter.report(UpdateEvent::WritingSettings);
        let settings_written = match self.layout.write_app_settings() {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("[Installer] {}", e);
                reporter.report(UpdateEvent::SettingsFailed { error: e.to_string() });
                false
            }
        };

        let mut report = UpdateReport {
            previous_version,
            version: version.to_string(),
            manifest_source,
            clean,
            packages: results,
            settings_written,
            marker_advanced: false,
            finished_at: chrono::Utc::now().to_rfc3339(),
        };

        // 5. 버전 기록
        if report.is_complete() || self.config.advance_marker_on_partial_failure {
            match self.store.write(version) {
                Ok(()) => {
                    report.marker_advanced = true;
                    reporter.report(UpdateEvent::VersionRecorded { version: version.to_string() });
                }
                Err(e) => tracing::error!("[Installer] {}", e),
            }
        } else {
            let failed = report.failed_count() + usize::from(!report.settings_written);
            tracing::warn!(
                "[Installer] {} step(s) failed; installed version marker left unchanged",
                failed
            );
            reporter.report(UpdateEvent::VersionWithheld {
                version: version.to_string(),
                failed,
            });
        }

        // 6. 다운로드 캐시 비우기
        let layout = self.layout.clone();
        match tokio::task::spawn_blocking(move || layout.clear_download_cache()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("[Installer] Could not clear download cache: {}", e),
            Err(e) => tracing::warn!("[Installer] Could not clear download cache: {}", e),
        }

        tracing::info!(
            "[Installer] Finished v{}: {}/{} package(s) installed",
            version,
            report.packages.len() - report.failed_count(),
            report.packages.len()
        );
        report
    }

    /// 매니페스트를 받아 패키지 목록 결정, 실패하면 대체 목록
    async fn resolve_packages(&self, version: &str, reporter: &dyn ProgressReporter) -> (Vec<String>, ManifestSource) {
        reporter.report(UpdateEvent::ManifestDownloading);

        let (packages, source) = match self.fetch_manifest(version).await {
            Ok(packages) => (packages, ManifestSource::Remote),
            Err(e) => {
                tracing::warn!("[Updater] Failed to download manifest: {}", e);
                // 방금 실패한 매니페스트는 다시 요청하지 않음
                let packages = self
                    .config
                    .fallback_packages
                    .iter()
                    .filter(|p| **p != self.config.manifest_name)
                    .cloned()
                    .collect();
                (packages, ManifestSource::Fallback { reason: e.to_string() })
            }
        };

        reporter.report(UpdateEvent::ManifestLoaded {
            packages: packages.len(),
            source: source.clone(),
        });
        (packages, source)
    }

    /// 매니페스트 다운로드 후 파싱
    async fn fetch_manifest(&self, version: &str) -> Result<Vec<String>, UpdaterError> {
        let name = &self.config.manifest_name;
        let url = self.client.package_url(version, name);
        let path = self.layout.download_dir().join(name);

        self.client.download_to_file(&url, &path).await?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| UpdaterError::parse("manifest", e.to_string()))?;

        let packages = manifest::parse_manifest(&content, self.config.manifest_denylist.as_slice());
        if packages.is_empty() {
            return Err(UpdaterError::parse("manifest", "no packages listed"));
        }
        Ok(packages)
    }

    /// 패키지 하나를 받아 대상 디렉터리에 해제(또는 이동)
    async fn install_package(&self, version: &str, package: &str) -> Result<PathBuf, UpdaterError> {
        if !is_plain_file_name(package) {
            return Err(UpdaterError::parse("manifest", format!("invalid package name '{}'", package)));
        }

        let url = self.client.package_url(version, package);
        let local = self.layout.download_dir().join(package);
        self.client.download_to_file(&url, &local).await?;

        let destination = self.layout.destination_for(package);
        tokio::fs::create_dir_all(&destination)
            .await
            .map_err(|e| UpdaterError::from_io(&e, "create directory", &destination))?;

        if manifest::is_archive(package) {
            let (archive, target) = (local.clone(), destination.clone());
            let count = tokio::task::spawn_blocking(move || layout::extract_archive(&archive, &target))
                .await
                .map_err(|e| UpdaterError::ArchiveError {
                    archive: package.to_string(),
                    message: e.to_string(),
                })??;
            tokio::fs::remove_file(&local)
                .await
                .map_err(|e| UpdaterError::from_io(&e, "remove", &local))?;
            tracing::debug!("[Installer] Extracted {} file(s) from {}", count, package);
        } else {
            let (file, target) = (local.clone(), destination.clone());
            tokio::task::spawn_blocking(move || layout::move_into(&file, &target))
                .await
                .map_err(|e| UpdaterError::FileSystemError {
                    operation: "move".into(),
                    path: local.display().to_string(),
                    message: e.to_string(),
                })??;
        }

        Ok(destination)
    }

    // ─── 실행 ────────────────────────────────────────────────────────

    /// 설치된 클라이언트 실행
    pub fn launch(&self, reporter: &dyn ProgressReporter) -> LaunchOutcome {
        let outcome = launcher::launch(&self.layout.executable_path());
        reporter.report(UpdateEvent::LaunchFinished { outcome: outcome.clone() });
        outcome
    }

    /// 업데이트 후 실행 (업데이트가 중단되면 실행하지 않음)
    pub async fn run(&self, reporter: &dyn ProgressReporter) -> RunOutcome {
        let update = self.update(reporter).await;
        let launch = match update {
            UpdateOutcome::Aborted { .. } => None,
            _ => Some(self.launch(reporter)),
        };
        RunOutcome { update, launch }
    }
}

/// 경로 구분자나 `..`가 없는 단일 파일 이름인지
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && Path::new(name).file_name().map(|n| n == name).unwrap_or(false)
}
