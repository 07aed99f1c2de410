//! Blocking overlay for a page that cannot start because its configuration is
//! incomplete. There is no automatic retry; the operator fixes the deployment
//! and the user reloads.

const OVERLAY_ID: &str = "config-error-overlay";
const RELOAD_ID: &str = "config-error-reload";

/// Overlay markup. The missing keys are listed so operators can spot the gap.
#[must_use]
pub fn config_error_html(missing: &[&str]) -> String {
    let details = if missing.is_empty() {
        String::new()
    } else {
        format!(
            r#"<p class="text-gray-400 text-xs mb-6">Missing: {}</p>"#,
            html_escape::encode_text(&missing.join(", "))
        )
    };
    format!(
        r#"<div id="{OVERLAY_ID}" class="fixed inset-0 bg-black/80 backdrop-blur-sm z-50 flex items-center justify-center p-4" role="alertdialog" aria-modal="true">
  <div class="bg-red-900/20 border border-red-500/30 rounded-2xl p-8 max-w-md text-center">
    <div class="w-16 h-16 bg-red-500 rounded-full flex items-center justify-center mx-auto mb-6">
      <svg class="w-8 h-8 text-white" fill="none" stroke="currentColor" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M12 9v2m0 4h.01m-6.938 4h13.856c1.54 0 2.502-1.667 1.732-2.5L13.732 4c-.77-.833-1.964-.833-2.732 0L3.732 16.5c-.77.833.192 2.5 1.732 2.5z"></path></svg>
    </div>
    <h2 class="text-2xl font-bold text-white mb-4">Configuration error</h2>
    <p class="text-gray-300 mb-4">The site configuration is incomplete. Please ask an administrator to check the deployment settings.</p>
    {details}
    <button id="{RELOAD_ID}" type="button" class="bg-red-500 hover:bg-red-600 text-white px-6 py-3 rounded-lg font-semibold transition-colors">Reload page</button>
  </div>
</div>"#
    )
}

/// Appends the overlay to `<body>` and wires its reload button.
#[cfg(target_arch = "wasm32")]
pub fn show_config_error(missing: &[&str]) {
    use wasm_bindgen::{JsCast, closure::Closure};

    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    if document.get_element_by_id(OVERLAY_ID).is_some() {
        return;
    }
    let Some(body) = document.body() else {
        return;
    };
    if body
        .insert_adjacent_html("beforeend", &config_error_html(missing))
        .is_err()
    {
        tracing::error!("Failed to render config error overlay");
        return;
    }

    let reload = document
        .get_element_by_id(RELOAD_ID)
        .and_then(|button| button.dyn_into::<web_sys::HtmlElement>().ok());
    if let Some(reload) = reload {
        let on_reload = Closure::once_into_js(move || {
            if let Err(err) = window.location().reload() {
                tracing::debug!("Reload failed: {err:?}");
            }
        });
        reload.set_onclick(Some(on_reload.unchecked_ref()));
    }
}
