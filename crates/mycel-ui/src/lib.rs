//! GTK4 kiosk frontend for the Mycel client
//!
//! Login screen, short-time start screen and the small status window shown
//! during a session.

mod app;
mod frontend;
mod state;

pub use app::KioskApp;
pub use frontend::{frontend_pair, GtkFrontend, UiLink};
pub use state::{format_remaining, FrontendState, SharedState};
