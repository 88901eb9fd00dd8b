//! Terminal UI: interactive play with a saved-boards picker, and the live
//! self-play dashboard.

pub mod app;
pub mod board_widget;
pub mod dashboard;
pub mod dashboard_view;
pub mod game_view;

pub use app::App;
pub use board_widget::BoardView;
