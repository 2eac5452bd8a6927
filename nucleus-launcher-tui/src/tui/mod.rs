//! Nucleus 런처: 터미널 창 모듈
//!
//! `main.rs`에서 `tui::run(manager, log_path).await`로 호출됩니다.
//! 엔진은 백그라운드 워커가 돌리고, UI 루프는 매 틱마다 워커 이벤트를 비웁니다.

pub mod app;
pub mod render;
pub mod theme;

use std::io::{self, stdout};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use nucleus_updater_lib::{BackgroundWorker, UpdateManager};
use ratatui::prelude::*;

use app::{Action, App, Out};

// ═══════════════════════════════════════════════════════
// 엔트리포인트
// ═══════════════════════════════════════════════════════

pub async fn run(manager: UpdateManager, log_path: &Path) -> anyhow::Result<()> {
    // 패닉 시 터미널 복원
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        default_hook(info);
    }));

    // 터미널 초기화
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // 앱 상태 생성
    let mut app = App::new(
        manager.layout().root().display().to_string(),
        manager.installed_version(),
    );
    app.push(Out::Info(format!("Logs: {}", log_path.display())));

    // ── 백그라운드 워커 ──────────────────────────────
    let (worker, mut events) = BackgroundWorker::spawn(Arc::new(manager));

    // 시작 시 버전 확인
    app.busy = true;
    if let Err(e) = worker.check_now() {
        app.busy = false;
        app.push(Out::Err(e));
    }

    // ── 메인 이벤트 루프 ──────────────────────────────
    let tick = Duration::from_millis(50);
    let mut last_render: Option<Instant> = None;

    loop {
        // --- 워커 이벤트 수신 ---
        while let Ok(ev) = events.try_recv() {
            app.apply(ev);
        }

        // --- 렌더링 ---
        if last_render.map_or(true, |t| t.elapsed() >= Duration::from_millis(16)) {
            terminal.draw(|f| render::render(&app, f))?;
            last_render = Some(Instant::now());
        }

        if app.quit {
            break;
        }

        // --- 이벤트 폴링 ---
        // poll은 블로킹이므로 워커가 진행되도록 런타임에 양보
        if event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                // Release/Repeat 이벤트 무시: Press만 처리
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let submitted = match app.handle_key(key) {
                    Action::Install => worker.install(),
                    Action::Launch => worker.launch(),
                    Action::Check => worker.check_now(),
                    Action::None | Action::Quit => Ok(()),
                };
                if let Err(e) = submitted {
                    app.busy = false;
                    app.push(Out::Err(e));
                }
            }
        } else {
            tokio::time::sleep(tick).await;
        }
    }

    // ── 정리 ──────────────────────────────────────────
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let _ = worker.shutdown();
    tracing::info!("[Launcher] Window closed");
    Ok(())
}
