//! Login-dependent page chrome. Pages mark elements with `data-auth="required"`
//! (signed-in only) or `data-auth="unauth"` (signed-out only); `#user-info`,
//! `#login-btn` and `#logout-btn` are optional named targets. Only the
//! synchronizer drives this view.

use crate::features::auth::types::UserRecord;
use std::rc::Rc;

pub const AUTH_REQUIRED_SELECTOR: &str = r#"[data-auth="required"]"#;
pub const AUTH_UNAUTH_SELECTOR: &str = r#"[data-auth="unauth"]"#;
pub const USER_INFO_ID: &str = "user-info";
pub const LOGIN_BUTTON_ID: &str = "login-btn";
pub const LOGOUT_BUTTON_ID: &str = "logout-btn";

pub trait AuthView {
    fn show_authenticated(&self, user: &UserRecord);

    fn show_unauthenticated(&self);

    /// Path of the current page, e.g. `/login.html`.
    fn current_path(&self) -> String;

    fn navigate(&self, path: &str);
}

impl<T: AuthView + ?Sized> AuthView for Rc<T> {
    fn show_authenticated(&self, user: &UserRecord) {
        (**self).show_authenticated(user);
    }

    fn show_unauthenticated(&self) {
        (**self).show_unauthenticated();
    }

    fn current_path(&self) -> String {
        (**self).current_path()
    }

    fn navigate(&self, path: &str) {
        (**self).navigate(path);
    }
}

/// Avatar initial plus display name for `#user-info`.
#[must_use]
pub fn user_badge_html(user: &UserRecord) -> String {
    format!(
        r#"<div class="flex items-center space-x-2">
  <div class="w-8 h-8 bg-brand rounded-full flex items-center justify-center">
    <span class="text-white text-sm font-semibold">{initial}</span>
  </div>
  <span class="text-white text-sm">{name}</span>
</div>"#,
        initial = html_escape::encode_text(&user.initial()),
        name = html_escape::encode_text(&user.display_name),
    )
}

#[cfg(target_arch = "wasm32")]
pub use browser::DomAuthView;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::{
        AUTH_REQUIRED_SELECTOR, AUTH_UNAUTH_SELECTOR, AuthView, LOGIN_BUTTON_ID, LOGOUT_BUTTON_ID,
        USER_INFO_ID, user_badge_html,
    };
    use crate::features::auth::types::UserRecord;
    use tracing::{debug, warn};
    use wasm_bindgen::JsCast;
    use web_sys::{Document, HtmlElement};

    /// Toggles the live document.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct DomAuthView;

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_display(document: &Document, selector: &str, display: &str) {
        let Ok(nodes) = document.query_selector_all(selector) else {
            return;
        };
        for index in 0..nodes.length() {
            let element = nodes
                .item(index)
                .and_then(|node| node.dyn_into::<HtmlElement>().ok());
            let Some(element) = element else {
                continue;
            };
            if let Err(err) = element.style().set_property("display", display) {
                debug!("Failed to set display on {selector}: {err:?}");
            }
        }
    }

    fn toggle_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(element) = document.get_element_by_id(id) {
            let classes = element.class_list();
            let toggled = if hidden {
                classes.add_1("hidden")
            } else {
                classes.remove_1("hidden")
            };
            if let Err(err) = toggled {
                debug!("Failed to toggle #{id}: {err:?}");
            }
        }
    }

    impl AuthView for DomAuthView {
        fn show_authenticated(&self, user: &UserRecord) {
            let Some(document) = document() else {
                return;
            };
            set_display(&document, AUTH_REQUIRED_SELECTOR, "block");
            set_display(&document, AUTH_UNAUTH_SELECTOR, "none");

            if let Some(info) = document.get_element_by_id(USER_INFO_ID) {
                info.set_inner_html(&user_badge_html(user));
                if let Err(err) = info.class_list().remove_1("hidden") {
                    debug!("Failed to show #{USER_INFO_ID}: {err:?}");
                }
            }
            toggle_hidden(&document, LOGIN_BUTTON_ID, true);
            toggle_hidden(&document, LOGOUT_BUTTON_ID, false);
        }

        fn show_unauthenticated(&self) {
            let Some(document) = document() else {
                return;
            };
            set_display(&document, AUTH_REQUIRED_SELECTOR, "none");
            set_display(&document, AUTH_UNAUTH_SELECTOR, "block");

            if let Some(info) = document.get_element_by_id(USER_INFO_ID) {
                info.set_inner_html("");
                if let Err(err) = info.class_list().add_1("hidden") {
                    debug!("Failed to hide #{USER_INFO_ID}: {err:?}");
                }
            }
            toggle_hidden(&document, LOGIN_BUTTON_ID, false);
            toggle_hidden(&document, LOGOUT_BUTTON_ID, true);
        }

        fn current_path(&self) -> String {
            web_sys::window()
                .and_then(|window| window.location().pathname().ok())
                .unwrap_or_default()
        }

        fn navigate(&self, path: &str) {
            let Some(window) = web_sys::window() else {
                return;
            };
            if let Err(err) = window.location().set_href(path) {
                warn!("Navigation to {path} failed: {err:?}");
            }
        }
    }
}
