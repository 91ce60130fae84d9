//! Small rendering helpers shared by the screens.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};

use super::screen::NoticeLevel;
use super::theme::Theme;

/// A `width` x `height` rect centered inside `area`, clamped to fit.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn notice_style(level: NoticeLevel, theme: &Theme) -> Style {
    match level {
        NoticeLevel::Info => Style::default().fg(theme.success),
        NoticeLevel::Warning => Style::default().fg(theme.warning),
        NoticeLevel::Error => Style::default()
            .fg(theme.error)
            .add_modifier(Modifier::BOLD),
    }
}
