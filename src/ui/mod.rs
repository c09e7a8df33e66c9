//! Ratatui front-end. `App` owns the session and the modal state; `run_app`
//! drives the crossterm event loop around it.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
