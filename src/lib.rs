pub mod app;
pub mod champions;
pub mod config;
pub mod lcu;
pub mod logging;

pub use app::{App, AppError};
