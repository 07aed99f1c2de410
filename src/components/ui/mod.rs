mod overlay;
mod toast;

pub use overlay::config_error_html;
#[cfg(target_arch = "wasm32")]
pub use overlay::show_config_error;
pub use toast::{
    AUTO_DISMISS_MS, FADE_MS, MemoryNotifier, Notifier, Toast, ToastHandle, ToastKind, ToastStack,
    toast_html,
};
#[cfg(target_arch = "wasm32")]
pub use toast::DomToaster;

pub const UNHANDLED_ERROR_MESSAGE: &str = "Something went wrong, please refresh the page";

/// Page-level fallback for errors nothing else caught.
pub fn report_unhandled_error(notifier: &dyn Notifier, detail: &str) -> ToastHandle {
    tracing::error!("Unhandled page error: {detail}");
    notifier.show(UNHANDLED_ERROR_MESSAGE, ToastKind::Error)
}
