//! 렌더링: 헤더(버전), 진행률 게이지, 로그 영역, 힌트바

use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, Gauge, Paragraph};

use super::app::{App, Out};
use super::theme::Theme;

// ═══════════════════════════════════════════════════════
// 최상위 렌더 함수 (전체 레이아웃)
// ═══════════════════════════════════════════════════════

pub fn render(app: &App, frame: &mut Frame) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // 헤더
            Constraint::Length(3), // 게이지
            Constraint::Min(5),    // 로그
            Constraint::Length(2), // 힌트바
        ])
        .split(area);

    render_header(app, frame, chunks[0]);
    render_gauge(app, frame, chunks[1]);
    render_log(app, frame, chunks[2]);
    render_hint_bar(app, frame, chunks[3]);
}

// ═══════════════════════════════════════════════════════
// 헤더 (설치 버전 / 서버 버전)
// ═══════════════════════════════════════════════════════

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let latest_style = if app.update_available() { Theme::stale() } else { Theme::version() };

    let versions = Line::from(vec![
        Span::styled("Installed ", Theme::label()),
        Span::styled(app.installed_label(), Theme::version()),
        Span::raw("   "),
        Span::styled("Server ", Theme::label()),
        Span::styled(app.latest_label(), latest_style),
    ]);
    let root = Line::from(vec![
        Span::styled("Root ", Theme::label()),
        Span::styled(app.install_root.clone(), Theme::dimmed()),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(" Nucleus Launcher ", Theme::title()));

    frame.render_widget(Paragraph::new(vec![versions, root]).block(block), area);
}

// ═══════════════════════════════════════════════════════
// 진행률 게이지
// ═══════════════════════════════════════════════════════

fn render_gauge(app: &App, frame: &mut Frame, area: Rect) {
    let (done, total) = app.progress;
    let label = if total == 0 {
        if app.busy { "Working...".to_string() } else { "Idle".to_string() }
    } else {
        format!("{}/{}", done, total)
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Theme::border()),
        )
        .gauge_style(Theme::gauge())
        .ratio(app.progress_ratio())
        .label(label);

    frame.render_widget(gauge, area);
}

// ═══════════════════════════════════════════════════════
// 로그 영역
// ═══════════════════════════════════════════════════════

fn out_line(out: &Out) -> Line<'static> {
    match out {
        Out::Info(s) => Line::from(vec![
            Span::styled("[*] ", Theme::dimmed()),
            Span::styled(s.clone(), Theme::info()),
        ]),
        Out::Ok(s) => Line::from(Span::styled(format!("[✓] {}", s), Theme::success())),
        Out::Warn(s) => Line::from(Span::styled(format!("[!] {}", s), Theme::warning())),
        Out::Err(s) => Line::from(Span::styled(format!("[!] {}", s), Theme::error())),
    }
}

fn render_log(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if app.busy { Theme::border_active() } else { Theme::border() })
        .title(Span::styled(" Log ", Theme::label()));

    let inner_height = block.inner(area).height as usize;

    // 맨 아래에서 scroll만큼 위로
    let end = app.log.len().saturating_sub(app.scroll);
    let start = end.saturating_sub(inner_height);
    let lines: Vec<Line> = app.log[start..end].iter().map(out_line).collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// ═══════════════════════════════════════════════════════
// 힌트바 (최하단: 단축키 안내)
// ═══════════════════════════════════════════════════════

fn render_hint_bar(app: &App, frame: &mut Frame, area: Rect) {
    let hints = [
        ("i", "install/update"),
        ("l", "launch"),
        ("c", "check"),
        ("↑↓", "scroll"),
        ("q", "quit"),
    ];

    let mut spans = vec![Span::raw(" ")];
    for (i, (key, desc)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  │  ", Theme::dimmed()));
        }
        spans.push(Span::styled(key.to_string(), Theme::shortcut()));
        spans.push(Span::styled(format!(" {}", desc), Theme::hint_bar()));
    }

    // 일시적 상태 메시지가 있으면 우측에 표시
    if let Some((msg, at)) = &app.status_message {
        if at.elapsed().as_secs() < 5 {
            let used: u16 = spans.iter().map(|s| s.width() as u16).sum();
            let padding = area.width.saturating_sub(used + msg.len() as u16 + 4);
            if padding > 0 {
                spans.push(Span::raw(" ".repeat(padding as usize)));
            }
            spans.push(Span::styled(format!(" {} ", msg), Theme::success()));
        }
    }

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Theme::border());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
