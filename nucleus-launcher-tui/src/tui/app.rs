//! 앱 상태 · 키 처리 · 워커 이벤트 반영
//!
//! 렌더링과 터미널 I/O가 없으므로 그대로 단위 테스트할 수 있습니다.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use nucleus_updater_lib::{
    version, EventLevel, LaunchOutcome, UpdateEvent, UpdateOutcome, WorkerEvent,
};

/// 로그 영역 최대 줄 수
pub const MAX_LOG_LINES: usize = 500;

// ═══════════════════════════════════════════════════════
// 출력 타입
// ═══════════════════════════════════════════════════════

/// 로그 영역의 한 줄
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Out {
    Info(String),
    Ok(String),
    Warn(String),
    Err(String),
}

impl Out {
    fn from_event(event: &UpdateEvent) -> Self {
        let msg = event.message();
        match event.level() {
            EventLevel::Info => Out::Info(msg),
            EventLevel::Success => Out::Ok(msg),
            EventLevel::Warning => Out::Warn(msg),
            EventLevel::Error => Out::Err(msg),
        }
    }
}

/// 키 입력의 결과로 워커에 요청할 작업
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    None,
    Check,
    Install,
    Launch,
    Quit,
}

// ═══════════════════════════════════════════════════════
// App
// ═══════════════════════════════════════════════════════

pub struct App {
    pub install_root: String,
    pub installed_version: Option<String>,
    pub latest_version: Option<String>,
    /// 워커가 작업 중인지 (요청 직후부터 Busy(false)까지)
    pub busy: bool,
    /// 패키지 진행률 (완료, 전체)
    pub progress: (usize, usize),
    pub log: Vec<Out>,
    /// 맨 아래 기준 스크롤 오프셋
    pub scroll: usize,
    /// 일시적 상태 메시지 (힌트바 우측)
    pub status_message: Option<(String, Instant)>,
    pub quit: bool,
}

impl App {
    pub fn new(install_root: String, installed_version: Option<String>) -> Self {
        Self {
            install_root,
            installed_version,
            latest_version: None,
            busy: false,
            progress: (0, 0),
            log: Vec::new(),
            scroll: 0,
            status_message: None,
            quit: false,
        }
    }

    pub fn push(&mut self, line: Out) {
        self.log.push(line);
        if self.log.len() > MAX_LOG_LINES {
            let excess = self.log.len() - MAX_LOG_LINES;
            self.log.drain(..excess);
        }
    }

    pub fn flash(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    pub fn installed_label(&self) -> String {
        version::display_version(self.installed_version.as_deref())
    }

    pub fn latest_label(&self) -> String {
        self.latest_version.clone().unwrap_or_else(|| "?".to_string())
    }

    /// 게이지 비율 (0.0 ~ 1.0)
    pub fn progress_ratio(&self) -> f64 {
        let (done, total) = self.progress;
        if total == 0 {
            0.0
        } else {
            (done.min(total) as f64) / (total as f64)
        }
    }

    pub fn update_available(&self) -> bool {
        match &self.latest_version {
            Some(latest) => self.installed_version.as_deref() != Some(latest.as_str()),
            None => false,
        }
    }

    // ─── 키 처리 ────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return Action::Quit;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.quit = true;
                Action::Quit
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll = (self.scroll + 1).min(self.log.len().saturating_sub(1));
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll = self.scroll.saturating_sub(1);
                Action::None
            }
            KeyCode::End => {
                self.scroll = 0;
                Action::None
            }
            KeyCode::Char('i') | KeyCode::Char('c') | KeyCode::Char('l') if self.busy => {
                self.flash("Busy, please wait");
                Action::None
            }
            KeyCode::Char('i') => {
                self.busy = true;
                self.progress = (0, 0);
                Action::Install
            }
            KeyCode::Char('l') => {
                self.busy = true;
                Action::Launch
            }
            KeyCode::Char('c') => {
                self.busy = true;
                Action::Check
            }
            _ => Action::None,
        }
    }

    // ─── 워커 이벤트 반영 ────────────────────────────────────────────────

    pub fn apply(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Busy(busy) => self.busy = busy,
            WorkerEvent::Update(ev) => self.apply_progress(ev),
            WorkerEvent::CheckFinished(result) => {
                self.installed_version = result.installed_version.clone();
                if let Some(latest) = result.latest_version.clone() {
                    self.latest_version = Some(latest);
                }
                let line = if result.error.is_some() {
                    Out::Err(result.summary())
                } else if result.update_available {
                    Out::Warn(format!("{} (press i to install)", result.summary()))
                } else {
                    Out::Ok(result.summary())
                };
                self.push(line);
            }
            WorkerEvent::UpdateFinished(outcome) => match outcome {
                UpdateOutcome::UpToDate { version } => {
                    self.installed_version = Some(version);
                }
                UpdateOutcome::Updated { report } => {
                    if report.marker_advanced {
                        self.installed_version = Some(report.version.clone());
                    }
                    let failed = report.failed_count();
                    if failed == 0 {
                        self.flash("Update complete");
                    } else {
                        self.flash(format!("{} package(s) failed", failed));
                    }
                }
                UpdateOutcome::Aborted { error } => {
                    self.push(Out::Err(error.user_message()));
                }
            },
            WorkerEvent::LaunchFinished(outcome) => {
                if let LaunchOutcome::Launched { .. } = outcome {
                    self.flash("Roblox launched");
                }
            }
            WorkerEvent::WorkerShutdown => {
                self.busy = false;
            }
        }
    }

    fn apply_progress(&mut self, event: UpdateEvent) {
        if let UpdateEvent::VersionResolved { installed, latest } = &event {
            self.installed_version = installed.clone();
            self.latest_version = Some(latest.clone());
        }
        if let UpdateEvent::VersionRecorded { version } = &event {
            self.installed_version = Some(version.clone());
        }
        if let Some(progress) = event.progress() {
            self.progress = progress;
        }
        // 패키지별 성공 줄은 게이지로 대신함
        if !matches!(event, UpdateEvent::PackageInstalled { .. }) {
            self.push(Out::from_event(&event));
        }
        self.scroll = 0;
    }
}
