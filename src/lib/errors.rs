use thiserror::Error;

/// Errors surfaced by the site glue. Messages are safe to show in a toast and
/// never carry token material.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AppError {
    /// Required configuration keys were missing from every source.
    #[error("Config error: missing {}", .missing.join(", "))]
    Config { missing: Vec<&'static str> },
    #[error("Auth backend error: {0}")]
    Backend(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Corrupt stored data: {0}")]
    Corrupt(String),
    #[error("Failed to load script: {0}")]
    Script(String),
    #[error("Browser error: {0}")]
    Js(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Corrupt(err.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for AppError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        AppError::Js(js_error_message(&value))
    }
}

/// Best-effort string form of a thrown JS value.
#[cfg(target_arch = "wasm32")]
pub(crate) fn js_error_message(value: &wasm_bindgen::JsValue) -> String {
    use wasm_bindgen::JsCast;

    if let Some(message) = value.as_string() {
        return message;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    js_sys::Reflect::get(value, &wasm_bindgen::JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}
