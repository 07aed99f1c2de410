//! Page components driven from Rust: login-dependent chrome, toasts, and the
//! configuration error overlay.

pub mod auth_view;
pub mod ui;

pub use auth_view::AuthView;
pub use ui::{Notifier, ToastKind};
