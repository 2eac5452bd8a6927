//! 콘솔 출력: 진행 이벤트를 `[*]` / `[✓]` / `[!]` 접두사 줄로 표시

use std::io::Write;

use nucleus_updater_lib::{
    EventLevel, LaunchOutcome, ProgressReporter, UpdateEvent, UpdateOutcome, UpdateReport,
};

/// 이벤트 수준별 접두사
pub fn prefix(level: EventLevel) -> &'static str {
    match level {
        EventLevel::Info => "[*]",
        EventLevel::Success => "[✓]",
        EventLevel::Warning | EventLevel::Error => "[!]",
    }
}

/// 진행 이벤트 한 줄
pub fn format_event(event: &UpdateEvent) -> String {
    format!("{} {}", prefix(event.level()), event.message())
}

/// stdout에 진행 상황을 출력하는 리포터
pub struct ConsoleReporter {
    /// 패키지별 설치 완료 줄 표시 여부 (`-v`)
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn should_print(&self, event: &UpdateEvent) -> bool {
        match event {
            UpdateEvent::PackageInstalled { .. } | UpdateEvent::ManifestDownloading => self.verbose,
            _ => true,
        }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, event: UpdateEvent) {
        if !self.should_print(&event) {
            return;
        }
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", format_event(&event));
        let _ = out.flush();
    }
}

/// 설치 패스 요약
pub fn report_summary(report: &UpdateReport) -> String {
    let total = report.packages.len();
    let failed = report.failed_count();
    if failed == 0 {
        format!("{} All {} package(s) installed", prefix(EventLevel::Success), total)
    } else {
        let names: Vec<&str> = report.failed_packages().map(|p| p.package.as_str()).collect();
        format!(
            "{} {}/{} package(s) installed; failed: {}",
            prefix(EventLevel::Warning),
            total - failed,
            total,
            names.join(", ")
        )
    }
}

/// 업데이트 결과로 종료 코드 결정 (실행하지 않는 `update` 명령용)
pub fn update_exit_code(outcome: &UpdateOutcome) -> i32 {
    match outcome {
        UpdateOutcome::UpToDate { .. } => 0,
        UpdateOutcome::Updated { report } if report.is_complete() => 0,
        _ => 1,
    }
}

/// 실행 결과로 종료 코드 결정
pub fn launch_exit_code(outcome: Option<&LaunchOutcome>) -> i32 {
    match outcome {
        Some(LaunchOutcome::Launched { .. }) => 0,
        _ => 1,
    }
}
