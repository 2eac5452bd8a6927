//! 업데이트 엔진 단위 테스트
//!
//! ## 테스트 시나리오
//! 1. 이벤트: 메시지/수준/진행률
//! 2. 중단: 버전 조회 실패 시 설치 상태 유지
//! 3. 실패 허용: 모든 패키지가 실패해도 패스 완료, 버전 기록 정책
//! 4. 워커: 태스크 처리와 종료
//!
//! 실제 서버가 필요한 시나리오는 루트 크레이트의 통합 테스트에 있습니다.

use crate::{
    is_plain_file_name, BackgroundTask, BackgroundWorker, LaunchOutcome, LauncherConfig, ManifestSource,
    PackageResult, PackageStatus, RecordingReporter, RunOutcome, UpdateEvent, UpdateManager, UpdateOutcome,
    UpdateReport, UpdaterError, WorkerEvent, EventLevel, NoopReporter, CleanReport,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// 아무도 듣지 않는 주소를 가리키는 설정
fn offline_config(root: &std::path::Path) -> LauncherConfig {
    let mut cfg = LauncherConfig::with_install_root(root);
    cfg.version_url = "http://127.0.0.1:1/info".to_string();
    cfg.package_url_template = "http://127.0.0.1:1/version-{version}-{package}".to_string();
    cfg.probe_timeout_secs = 2;
    cfg
}

fn report_with(packages: Vec<PackageResult>, settings_written: bool) -> UpdateReport {
    UpdateReport {
        previous_version: None,
        version: "600".into(),
        manifest_source: ManifestSource::Remote,
        clean: CleanReport::default(),
        packages,
        settings_written,
        marker_advanced: false,
        finished_at: "2026-01-01T00:00:00Z".into(),
    }
}

fn installed(name: &str) -> PackageResult {
    PackageResult {
        package: name.into(),
        status: PackageStatus::Installed { destination: PathBuf::from("/tmp") },
    }
}

fn failed(name: &str) -> PackageResult {
    PackageResult {
        package: name.into(),
        status: PackageStatus::Failed { reason: "404".into() },
    }
}

// ═══════════════════════════════════════════════════════
// 테스트 1: 이벤트
// ═══════════════════════════════════════════════════════

#[test]
fn test_event_messages() {
    let e = UpdateEvent::VersionResolved { installed: None, latest: "600".into() };
    assert_eq!(e.message(), "Installed version: N/A, server version: 600");

    let e = UpdateEvent::PackageStarted { package: "ssl.zip".into(), index: 2, total: 5 };
    assert_eq!(e.message(), "Downloading ssl.zip (2/5)...");

    let e = UpdateEvent::LaunchFinished {
        outcome: LaunchOutcome::NotInstalled { path: PathBuf::from("x") },
    };
    assert_eq!(e.message(), "Roblox is not installed. Please run the updater first.");
}

#[test]
fn test_event_levels() {
    assert_eq!(UpdateEvent::UpToDate { version: "1".into() }.level(), EventLevel::Success);
    assert_eq!(UpdateEvent::CheckFailed { error: "x".into() }.level(), EventLevel::Error);
    assert_eq!(
        UpdateEvent::ManifestLoaded {
            packages: 23,
            source: ManifestSource::Fallback { reason: "404".into() },
        }
        .level(),
        EventLevel::Warning
    );
    assert_eq!(
        UpdateEvent::LaunchFinished { outcome: LaunchOutcome::Launched { pid: 1 } }.level(),
        EventLevel::Success
    );
    assert_eq!(
        UpdateEvent::LaunchFinished { outcome: LaunchOutcome::Failed { reason: "x".into() } }.level(),
        EventLevel::Error
    );
    assert_eq!(UpdateEvent::Cleaning.level(), EventLevel::Info);
}

#[test]
fn test_event_progress() {
    let loaded = UpdateEvent::ManifestLoaded { packages: 4, source: ManifestSource::Remote };
    assert_eq!(loaded.progress(), Some((0, 4)));
    let done = UpdateEvent::PackageFailed {
        package: "a.zip".into(),
        index: 3,
        total: 4,
        error: "x".into(),
    };
    assert_eq!(done.progress(), Some((3, 4)));
    assert_eq!(UpdateEvent::WritingSettings.progress(), None);
}

#[test]
fn test_report_completeness() {
    assert!(report_with(vec![installed("a.zip"), installed("b.zip")], true).is_complete());

    let partial = report_with(vec![installed("a.zip"), failed("b.zip")], true);
    assert!(!partial.is_complete());
    assert_eq!(partial.failed_count(), 1);
    assert_eq!(partial.failed_packages().next().map(|p| p.package.as_str()), Some("b.zip"));

    assert!(!report_with(vec![installed("a.zip")], false).is_complete());
}

#[test]
fn test_run_outcome_success() {
    let ok = RunOutcome {
        update: UpdateOutcome::UpToDate { version: "600".into() },
        launch: Some(LaunchOutcome::Launched { pid: 42 }),
    };
    assert!(ok.is_success());

    let aborted = RunOutcome {
        update: UpdateOutcome::Aborted { error: UpdaterError::parse("version response", "bad") },
        launch: None,
    };
    assert!(!aborted.is_success());
}

#[test]
fn test_package_name_validation() {
    assert!(is_plain_file_name("RobloxApp.zip"));
    assert!(is_plain_file_name("WebView2RuntimeInstaller.zip"));
    assert!(!is_plain_file_name("../evil.zip"));
    assert!(!is_plain_file_name("content/fonts.zip"));
    assert!(!is_plain_file_name("content\\fonts.zip"));
    assert!(!is_plain_file_name(".."));
    assert!(!is_plain_file_name(""));
}

#[test]
fn test_update_outcome_serializes_with_tag() {
    let json = serde_json::to_value(UpdateOutcome::UpToDate { version: "600".into() }).unwrap();
    assert_eq!(json["result"], "up_to_date");
    assert_eq!(json["version"], "600");
}

// ═══════════════════════════════════════════════════════
// 테스트 2: 중단
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_probe_failure_aborts_without_touching_install() {
    let tmp = TempDir::new().unwrap();
    let manager = UpdateManager::new(offline_config(tmp.path())).unwrap();

    std::fs::write(tmp.path().join("installed_version.txt"), "599").unwrap();
    std::fs::write(tmp.path().join("RobloxApp.dll"), "old").unwrap();

    let reporter = RecordingReporter::new();
    let outcome = manager.run(&reporter).await;

    assert!(matches!(outcome.update, UpdateOutcome::Aborted { .. }));
    assert!(outcome.launch.is_none(), "aborted update must not launch");
    assert!(!outcome.is_success());

    // 설치 상태 유지
    assert_eq!(manager.installed_version().as_deref(), Some("599"));
    assert!(tmp.path().join("RobloxApp.dll").exists());

    let events = reporter.events();
    assert_eq!(events.first(), Some(&UpdateEvent::CheckStarted));
    assert!(matches!(events.last(), Some(UpdateEvent::CheckFailed { .. })));
    assert!(!events.contains(&UpdateEvent::Cleaning));
}

#[tokio::test]
async fn test_check_reports_network_error() {
    let tmp = TempDir::new().unwrap();
    let manager = UpdateManager::new(offline_config(tmp.path())).unwrap();

    let err = manager.check().await.unwrap_err();
    assert!(err.is_network(), "{:?}", err);
}

#[test]
fn test_new_rejects_invalid_config() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = offline_config(tmp.path());
    cfg.package_url_template = "http://127.0.0.1:1/static".into();
    assert!(matches!(UpdateManager::new(cfg), Err(UpdaterError::ConfigError { .. })));
}

#[test]
fn test_new_creates_install_root_and_cache() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("NucleusRobloxVersion");
    let manager = UpdateManager::new(offline_config(&root)).unwrap();

    assert!(root.is_dir());
    assert!(root.join("downloads").is_dir());
    assert_eq!(manager.installed_version(), None);
    assert!(!manager.is_installed());
}

// ═══════════════════════════════════════════════════════
// 테스트 3: 실패 허용
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_install_with_unreachable_cdn_completes_pass() {
    let tmp = TempDir::new().unwrap();
    let manager = UpdateManager::new(offline_config(tmp.path())).unwrap();
    std::fs::write(tmp.path().join("stale.txt"), "x").unwrap();

    let reporter = RecordingReporter::new();
    let report = manager.install_version("600", &reporter).await;

    // 매니페스트 실패 → 대체 목록(매니페스트 제외 22개), 전부 실패해도 끝까지 진행
    assert!(matches!(report.manifest_source, ManifestSource::Fallback { .. }));
    assert_eq!(report.packages.len(), 22);
    assert!(report.packages.iter().all(|p| p.package != "rbxPkgManifest.txt"));
    assert_eq!(report.failed_count(), 22);
    assert!(report.settings_written);
    assert!(!report.marker_advanced);

    assert!(!tmp.path().join("stale.txt").exists(), "clean removes old files");
    assert!(tmp.path().join("AppSettings.xml").is_file());
    assert_eq!(manager.installed_version(), None);

    let events = reporter.events();
    assert!(events.iter().any(|e| matches!(e, UpdateEvent::VersionWithheld { failed: 22, .. })));
    assert_eq!(
        events.iter().filter(|e| matches!(e, UpdateEvent::PackageFailed { .. })).count(),
        22
    );
}

#[tokio::test(flavor = "current_thread")]
async fn test_clean_runs_off_the_runtime_thread() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = offline_config(tmp.path());
    cfg.fallback_packages = vec!["RobloxApp.zip".into()];
    let manager = UpdateManager::new(cfg).unwrap();

    let deep = tmp.path().join("content").join("textures").join("sky");
    std::fs::create_dir_all(&deep).unwrap();
    for i in 0..50 {
        std::fs::write(deep.join(format!("{}.dds", i)), "x").unwrap();
    }
    std::fs::write(tmp.path().join("installed_version.txt"), "599").unwrap();

    // 정리 중에도 같은 스레드의 다른 태스크가 진행되어야 함
    let ticker = tokio::spawn(async { tokio::task::yield_now().await; true });
    let report = manager.install_version("600", &NoopReporter).await;

    assert!(ticker.await.unwrap());
    assert!(report.clean.failed.is_empty(), "{:?}", report.clean.failed);
    assert!(report.clean.removed.contains(&"content".to_string()));
    assert!(!tmp.path().join("content").exists());
    assert_eq!(manager.installed_version().as_deref(), Some("599"));
    assert!(tmp.path().join("downloads").is_dir());
}

#[tokio::test]
async fn test_partial_failure_policy_advances_marker() {
    let tmp = TempDir::new().unwrap();
    let mut cfg = offline_config(tmp.path());
    cfg.advance_marker_on_partial_failure = true;
    cfg.fallback_packages = vec!["RobloxApp.zip".into(), "ssl.zip".into()];
    let manager = UpdateManager::new(cfg).unwrap();

    let report = manager.install_version("600", &NoopReporter).await;

    assert_eq!(report.packages.len(), 2);
    assert!(report.marker_advanced);
    assert_eq!(manager.installed_version().as_deref(), Some("600"));
}

// ═══════════════════════════════════════════════════════
// 테스트 4: 워커
// ═══════════════════════════════════════════════════════

async fn next_event(rx: &mut tokio::sync::mpsc::UnboundedReceiver<WorkerEvent>) -> WorkerEvent {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("worker event timeout")
        .expect("worker channel closed")
}

#[tokio::test]
async fn test_background_worker() {
    let tmp = TempDir::new().unwrap();
    let manager = Arc::new(UpdateManager::new(offline_config(tmp.path())).unwrap());
    let (worker, mut rx) = BackgroundWorker::spawn(manager);

    worker.check_now().unwrap();
    assert_eq!(next_event(&mut rx).await, WorkerEvent::Busy(true));
    match next_event(&mut rx).await {
        WorkerEvent::CheckFinished(result) => {
            assert!(result.error.is_some());
            assert!(!result.update_available);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(next_event(&mut rx).await, WorkerEvent::Busy(false));

    worker.launch().unwrap();
    assert_eq!(next_event(&mut rx).await, WorkerEvent::Busy(true));
    assert!(matches!(
        next_event(&mut rx).await,
        WorkerEvent::Update(UpdateEvent::LaunchFinished { outcome: LaunchOutcome::NotInstalled { .. } })
    ));
    assert!(matches!(
        next_event(&mut rx).await,
        WorkerEvent::LaunchFinished(LaunchOutcome::NotInstalled { .. })
    ));
    assert_eq!(next_event(&mut rx).await, WorkerEvent::Busy(false));

    let status = worker.get_status().await;
    assert!(!status.busy);
    assert_eq!(status.completed_tasks, 2);

    worker.submit(BackgroundTask::Shutdown).unwrap();
    assert_eq!(next_event(&mut rx).await, WorkerEvent::WorkerShutdown);
}
