//! 테마 · 스타일 상수: 창 전체에서 일관된 색상 사용

use ratatui::style::{Color, Modifier, Style};

/// 모든 스타일을 중앙 관리하는 네임스페이스
pub struct Theme;

impl Theme {
    // ─── 로그 수준 ───
    pub fn info()    -> Style { Style::default().fg(Color::White) }
    pub fn success() -> Style { Style::default().fg(Color::Green) }
    pub fn warning() -> Style { Style::default().fg(Color::Yellow) }
    pub fn error()   -> Style { Style::default().fg(Color::Red) }

    // ─── 테두리 ───
    pub fn border()        -> Style { Style::default().fg(Color::DarkGray) }
    pub fn border_active() -> Style { Style::default().fg(Color::Cyan) }

    // ─── 타이틀 · 라벨 ───
    pub fn title()   -> Style { Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD) }
    pub fn label()   -> Style { Style::default().fg(Color::DarkGray) }
    pub fn version() -> Style { Style::default().fg(Color::White).add_modifier(Modifier::BOLD) }
    pub fn stale()   -> Style { Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD) }

    // ─── 게이지 ───
    pub fn gauge() -> Style { Style::default().fg(Color::Cyan).bg(Color::Black) }

    // ─── 힌트바 ───
    pub fn shortcut() -> Style { Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD) }
    pub fn hint_bar() -> Style { Style::default().fg(Color::DarkGray) }
    pub fn dimmed()   -> Style { Style::default().fg(Color::DarkGray) }
}
