mod app;
mod explorer;
mod widgets;

pub use app::TuiApp;
