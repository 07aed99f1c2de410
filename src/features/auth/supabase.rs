//! Supabase SDK binding. The SDK is a plain script exposing `window.supabase`,
//! so it is injected on demand and driven through `js_sys::Reflect`. Every auth
//! call resolves to `{ data, error }`; a non-null `error` becomes
//! `AppError::Backend`. Session payloads are converted through JSON into the
//! typed `Session` and are never logged.

use super::{
    client::{AuthBackend, AuthEventSink, OAuthProvider},
    types::{AuthEvent, AuthEventKind, Session},
};
use crate::app_lib::{AppError, config::AppConfig, errors::js_error_message};
use async_trait::async_trait;
use js_sys::{Array, Function, JSON, Promise, Reflect};
use std::cell::RefCell;
use tracing::{debug, info, warn};
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use wasm_bindgen_futures::JsFuture;

pub const SDK_URL: &str = "https://unpkg.com/@supabase/supabase-js@2";
const SDK_GLOBAL: &str = "supabase";

type AuthListener = Closure<dyn FnMut(JsValue, JsValue)>;

fn window() -> Result<web_sys::Window, AppError> {
    web_sys::window().ok_or_else(|| AppError::Js("Window not found".to_string()))
}

fn sdk_namespace(window: &web_sys::Window) -> Option<JsValue> {
    Reflect::get(window, &JsValue::from_str(SDK_GLOBAL))
        .ok()
        .filter(|value| !value.is_null() && !value.is_undefined())
}

fn get(target: &JsValue, key: &str) -> Result<JsValue, AppError> {
    Ok(Reflect::get(target, &JsValue::from_str(key))?)
}

fn function(target: &JsValue, name: &str) -> Result<Function, AppError> {
    get(target, name)?
        .dyn_into::<Function>()
        .map_err(|_| AppError::Js(format!("{name} is not a function")))
}

/// Injects the SDK `<script>` unless `window.supabase` already exists, and
/// waits for it to load.
///
/// # Errors
/// Returns `AppError::Script` if the script fails to load.
pub async fn load_sdk() -> Result<(), AppError> {
    let window = window()?;
    if sdk_namespace(&window).is_some() {
        debug!("Supabase SDK already present");
        return Ok(());
    }

    let document = window
        .document()
        .ok_or_else(|| AppError::Js("Document not found".to_string()))?;
    let head = document
        .head()
        .ok_or_else(|| AppError::Js("Document has no <head>".to_string()))?;
    let script = document
        .create_element("script")?
        .dyn_into::<web_sys::HtmlScriptElement>()
        .map_err(|_| AppError::Js("Failed to create <script>".to_string()))?;
    script.set_src(SDK_URL);

    let loaded = Promise::new(&mut |resolve, reject| {
        script.set_onload(Some(&resolve));
        script.set_onerror(Some(&reject));
    });
    head.append_child(&script)?;

    JsFuture::from(loaded)
        .await
        .map_err(|_| AppError::Script(SDK_URL.to_string()))?;
    info!("Supabase SDK loaded");
    Ok(())
}

fn response_error(response: &JsValue) -> Option<String> {
    let error = Reflect::get(response, &JsValue::from_str("error")).ok()?;
    if error.is_null() || error.is_undefined() {
        None
    } else {
        Some(js_error_message(&error))
    }
}

fn parse_session(value: &JsValue) -> Result<Option<Session>, AppError> {
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }
    let json = String::from(JSON::stringify(value)?);
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|err| AppError::Backend(format!("Malformed session payload: {err}")))
}

/// `data.session` from an auth response, tolerating a missing `data`.
fn response_session(response: &JsValue) -> Result<Option<Session>, AppError> {
    let data = get(response, "data")?;
    if data.is_null() || data.is_undefined() {
        return Ok(None);
    }
    parse_session(&get(&data, "session")?)
}

/// Handle to a `supabase.createClient(url, key)` instance.
pub struct SupabaseClient {
    client: JsValue,
    listener: RefCell<Option<AuthListener>>,
}

impl SupabaseClient {
    /// Creates the client. The SDK must already be loaded.
    ///
    /// # Errors
    /// Returns `AppError::Script` when the SDK is missing, or `AppError::Js`
    /// if `createClient` throws.
    pub fn create(config: &AppConfig) -> Result<Self, AppError> {
        let window = window()?;
        let namespace = sdk_namespace(&window)
            .ok_or_else(|| AppError::Script("Supabase SDK is not loaded".to_string()))?;
        let create = function(&namespace, "createClient")?;
        let client = create.call2(
            &namespace,
            &JsValue::from_str(&config.endpoint_url),
            &JsValue::from_str(&config.endpoint_key),
        )?;
        info!(endpoint = %config.endpoint_url, "Supabase client created");

        Ok(Self {
            client,
            listener: RefCell::new(None),
        })
    }

    fn auth(&self) -> Result<JsValue, AppError> {
        get(&self.client, "auth")
    }

    async fn call_auth(&self, method: &str, args: &Array) -> Result<JsValue, AppError> {
        let auth = self.auth()?;
        let returned = function(&auth, method)?.apply(&auth, args)?;
        let response = JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(|err| AppError::Backend(js_error_message(&err)))?;
        match response_error(&response) {
            Some(message) => Err(AppError::Backend(message)),
            None => Ok(response),
        }
    }
}

#[async_trait(?Send)]
impl AuthBackend for SupabaseClient {
    async fn get_session(&self) -> Result<Option<Session>, AppError> {
        let response = self.call_auth("getSession", &Array::new()).await?;
        response_session(&response)
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<Option<Session>, AppError> {
        let options = serde_json::json!({
            "provider": provider.as_str(),
            "options": { "redirectTo": redirect_to },
        });
        let options = JSON::parse(&options.to_string())?;
        let response = self
            .call_auth("signInWithOAuth", &Array::of1(&options))
            .await?;
        response_session(&response)
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        self.call_auth("signOut", &Array::new()).await.map(|_| ())
    }

    fn subscribe(&self, sink: AuthEventSink) -> Result<(), AppError> {
        let listener = AuthListener::new(move |event: JsValue, session: JsValue| {
            let Some(name) = event.as_string() else {
                return;
            };
            let Some(kind) = AuthEventKind::parse(&name) else {
                debug!(event = %name, "Ignoring auth event");
                return;
            };
            let session = parse_session(&session).unwrap_or_else(|err| {
                warn!(event = %name, "Dropping session payload: {err}");
                None
            });
            sink.emit(AuthEvent::new(kind, session));
        });

        let auth = self.auth()?;
        function(&auth, "onAuthStateChange")?.call1(&auth, listener.as_ref())?;
        self.listener.replace(Some(listener));
        debug!("Subscribed to auth state changes");
        Ok(())
    }
}
