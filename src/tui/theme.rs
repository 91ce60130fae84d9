//! Semantic colors for the queue console (Catppuccin Mocha values).

use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub border: Color,
    /// Rows with a staged, uncommitted edit.
    pub pending_bg: Color,
    pub pending_fg: Color,
    /// Checkbox marker for rows in the bulk selection.
    pub selected: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),
            muted: Color::Rgb(0x6c, 0x70, 0x86),
            accent: Color::Rgb(0x89, 0xb4, 0xfa),
            border: Color::Rgb(0x45, 0x47, 0x5a),
            pending_bg: Color::Rgb(0xf9, 0xe2, 0xaf),
            pending_fg: Color::Rgb(0x1e, 0x1e, 0x2e),
            selected: Color::Rgb(0xa6, 0xe3, 0xa1),
            success: Color::Rgb(0xa6, 0xe3, 0xa1),
            warning: Color::Rgb(0xfa, 0xb3, 0x87),
            error: Color::Rgb(0xf3, 0x8b, 0xa8),
        }
    }
}
