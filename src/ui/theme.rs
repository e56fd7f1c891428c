use ratatui::style::Color;

pub const BG_PRIMARY: Color = Color::Rgb(0, 0, 0);
pub const BG_PANEL: Color = Color::Rgb(12, 12, 12);
pub const FG_PRIMARY: Color = Color::Rgb(190, 190, 190);
pub const FG_DIM: Color = Color::Rgb(128, 128, 128);

pub const BAR_BG: Color = Color::Rgb(23, 52, 127);
pub const BAR_TEXT: Color = Color::Rgb(235, 240, 255);

pub const BORDER_IDLE: Color = Color::Rgb(61, 120, 120);
pub const BORDER_FOCUS: Color = Color::Rgb(187, 94, 0);

pub const USER_FG: Color = Color::Rgb(120, 160, 255);
pub const ASSISTANT_FG: Color = Color::Rgb(140, 200, 140);
pub const ERROR_FG: Color = Color::Rgb(220, 90, 90);
pub const SUGGESTION_FG: Color = Color::Rgb(200, 180, 90);

pub const OVERLAY_BG: Color = Color::Rgb(20, 20, 28);
pub const FIELD_FOCUS_BG: Color = Color::Rgb(50, 50, 70);
pub const PICKER_HIGHLIGHT_BG: Color = Color::Rgb(73, 102, 177);
pub const PICKER_HIGHLIGHT_TEXT: Color = Color::Rgb(255, 255, 255);
