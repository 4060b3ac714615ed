pub mod format;
pub mod history;
pub mod layout;
pub mod table;
pub mod theme;

pub use layout::draw_ui;
pub use theme::Theme;
