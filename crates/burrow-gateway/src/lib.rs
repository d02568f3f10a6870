//! HTTP surface of the Burrow URL shortener.

pub mod app;
pub mod cookie;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;
pub mod telemetry;

pub use app::App;
pub use state::{AppState, DynGenerator};
