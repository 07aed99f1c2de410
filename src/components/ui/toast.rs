//! Transient toast notifications. Each toast is independent: it fades out on
//! its own timer and can be closed early without touching its neighbours.
//! Messages are escaped before rendering and must never include tokens.

use std::{cell::RefCell, rc::Rc};

/// Time a toast stays on screen before fading.
pub const AUTO_DISMISS_MS: u32 = 3_500;
/// Fade-out duration before the element is removed.
pub const FADE_MS: u32 = 200;

/// Supported toast styles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

impl ToastKind {
    #[must_use]
    pub fn class(self) -> &'static str {
        match self {
            ToastKind::Success => {
                "p-4 rounded-2xl shadow-lg animate-fade-in backdrop-blur-sm bg-green-900/20 transition-all"
            }
            ToastKind::Error => {
                "p-4 rounded-2xl shadow-lg animate-fade-in backdrop-blur-sm bg-red-900/20 transition-all"
            }
            ToastKind::Info => {
                "p-4 rounded-2xl shadow-lg animate-fade-in backdrop-blur-sm bg-gray-900/20 transition-all"
            }
        }
    }

    fn icon(self) -> (&'static str, &'static str) {
        match self {
            ToastKind::Success => ("text-green-400", "M5 13l4 4L19 7"),
            ToastKind::Error => ("text-red-400", "M6 18L18 6M6 6l12 12"),
            ToastKind::Info => (
                "text-gray-400",
                "M13 16h-1v-4h-1m1-4h.01M21 12a9 9 0 11-18 0 9 9 0 0118 0z",
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ToastHandle(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub handle: ToastHandle,
    pub message: String,
    pub kind: ToastKind,
}

/// Shows user-facing notices.
pub trait Notifier {
    fn show(&self, message: &str, kind: ToastKind) -> ToastHandle;
}

impl<T: Notifier + ?Sized> Notifier for Rc<T> {
    fn show(&self, message: &str, kind: ToastKind) -> ToastHandle {
        (**self).show(message, kind)
    }
}

/// Toasts currently on screen, in display order.
#[derive(Debug, Default)]
pub struct ToastStack {
    next_id: u64,
    active: Vec<Toast>,
}

impl ToastStack {
    pub fn push(&mut self, message: &str, kind: ToastKind) -> ToastHandle {
        self.next_id += 1;
        let handle = ToastHandle(self.next_id);
        self.active.push(Toast {
            handle,
            message: message.to_string(),
            kind,
        });
        handle
    }

    /// Removes one toast. Returns `false` if it was already gone.
    pub fn dismiss(&mut self, handle: ToastHandle) -> bool {
        let before = self.active.len();
        self.active.retain(|toast| toast.handle != handle);
        self.active.len() != before
    }

    #[must_use]
    pub fn active(&self) -> &[Toast] {
        &self.active
    }
}

/// Notifier that only records toasts; used off-browser and in tests.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    stack: RefCell<ToastStack>,
    history: RefCell<Vec<Toast>>,
}

impl MemoryNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every toast ever shown, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Toast> {
        self.history.borrow().clone()
    }

    #[must_use]
    pub fn active(&self) -> Vec<Toast> {
        self.stack.borrow().active().to_vec()
    }

    pub fn dismiss(&self, handle: ToastHandle) -> bool {
        self.stack.borrow_mut().dismiss(handle)
    }
}

impl Notifier for MemoryNotifier {
    fn show(&self, message: &str, kind: ToastKind) -> ToastHandle {
        let handle = self.stack.borrow_mut().push(message, kind);
        self.history.borrow_mut().push(Toast {
            handle,
            message: message.to_string(),
            kind,
        });
        handle
    }
}

/// Inner markup of one toast: icon, escaped message, close button.
#[must_use]
pub fn toast_html(message: &str, kind: ToastKind) -> String {
    let (icon_class, icon_path) = kind.icon();
    format!(
        r#"<div class="flex items-center space-x-3">
  <div class="flex-shrink-0">
    <svg class="w-5 h-5 {icon_class}" fill="none" stroke="currentColor" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="{icon_path}"></path></svg>
  </div>
  <div class="flex-1"><p class="text-white font-medium">{message}</p></div>
  <button type="button" data-toast-close class="flex-shrink-0 text-gray-400 hover:text-white transition-colors" aria-label="Close">
    <svg class="w-4 h-4" fill="none" stroke="currentColor" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M6 18L18 6M6 6l12 12"></path></svg>
  </button>
</div>"#,
        message = html_escape::encode_text(message)
    )
}

#[cfg(target_arch = "wasm32")]
pub use browser::DomToaster;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::{AUTO_DISMISS_MS, FADE_MS, Notifier, ToastHandle, ToastKind, ToastStack, toast_html};
    use gloo_timers::callback::Timeout;
    use std::{cell::RefCell, rc::Rc};
    use tracing::{debug, warn};
    use wasm_bindgen::{JsCast, closure::Closure};
    use web_sys::{Document, HtmlElement};

    const CONTAINER_ID: &str = "toast-stack";
    const CONTAINER_CLASS: &str = "fixed bottom-4 right-4 z-50 flex flex-col items-end gap-2";

    /// Renders toasts into a fixed bottom-right column.
    #[derive(Clone, Default)]
    pub struct DomToaster {
        stack: Rc<RefCell<ToastStack>>,
    }

    impl DomToaster {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        fn container(document: &Document) -> Option<web_sys::Element> {
            if let Some(existing) = document.get_element_by_id(CONTAINER_ID) {
                return Some(existing);
            }
            let container = document.create_element("div").ok()?;
            container.set_id(CONTAINER_ID);
            container.set_class_name(CONTAINER_CLASS);
            document.body()?.append_child(&container).ok()?;
            Some(container)
        }

        fn render(&self, handle: ToastHandle, message: &str, kind: ToastKind) -> Option<()> {
            let document = web_sys::window()?.document()?;
            let container = Self::container(&document)?;
            let element = document
                .create_element("div")
                .ok()?
                .dyn_into::<HtmlElement>()
                .ok()?;
            element.set_class_name(kind.class());
            element.set_inner_html(&toast_html(message, kind));
            container.append_child(&element).ok()?;

            let close = element
                .query_selector("[data-toast-close]")
                .ok()
                .flatten()
                .and_then(|button| button.dyn_into::<HtmlElement>().ok());
            if let Some(close) = close {
                let stack = Rc::clone(&self.stack);
                let target = element.clone();
                let on_close = Closure::once_into_js(move || {
                    stack.borrow_mut().dismiss(handle);
                    target.remove();
                });
                close.set_onclick(Some(on_close.unchecked_ref()));
            }

            let stack = Rc::clone(&self.stack);
            Timeout::new(AUTO_DISMISS_MS, move || {
                if !stack.borrow_mut().dismiss(handle) {
                    return;
                }
                let style = element.style();
                for (property, value) in [("opacity", "0"), ("transform", "translateY(-5px)")] {
                    if let Err(err) = style.set_property(property, value) {
                        debug!("Failed to set toast {property}: {err:?}");
                    }
                }
                Timeout::new(FADE_MS, move || element.remove()).forget();
            })
            .forget();

            Some(())
        }
    }

    impl Notifier for DomToaster {
        fn show(&self, message: &str, kind: ToastKind) -> ToastHandle {
            let handle = self.stack.borrow_mut().push(message, kind);
            if self.render(handle, message, kind).is_none() {
                warn!("Failed to render toast");
                self.stack.borrow_mut().dismiss(handle);
            }
            handle
        }
    }
}
