//! Page bootstrap. Config is resolved before anything touches the backend and
//! the stored session is shown before the SDK starts loading. Controls and
//! page events only enqueue requests, so they are wired before the
//! synchronizer loop starts and keep working if the SDK never arrives.

use crate::{
    app_lib::{AppError, build_info, config::Resolver, logging, storage::LocalStorage},
    components::{
        auth_view::{DomAuthView, LOGIN_BUTTON_ID, LOGOUT_BUTTON_ID},
        ui::{DomToaster, report_unhandled_error, show_config_error},
    },
    features::auth::{
        AuthHandle, boot,
        supabase::{self, SupabaseClient},
    },
};
use tracing::{debug, error, info};
use wasm_bindgen::{JsCast, closure::Closure};
use wasm_bindgen_futures::spawn_local;

pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    let resolver = Resolver::from_page();
    let level = resolver
        .lookup(logging::LOG_LEVEL)
        .as_deref()
        .and_then(logging::parse_level)
        .unwrap_or(logging::DEFAULT_LEVEL);
    logging::init(level);
    info!(commit = build_info::git_commit_hash(), "Starting AI-Day web");

    let toaster = DomToaster::new();
    install_error_handlers(&toaster);

    let booted = boot(&resolver, LocalStorage, DomAuthView, toaster, |config| async move {
        supabase::load_sdk().await?;
        SupabaseClient::create(&config)
    });
    let booted = match booted {
        Ok(booted) => booted,
        Err(AppError::Config { missing }) => {
            error!(?missing, "Configuration incomplete, not starting auth");
            show_config_error(&missing);
            return;
        }
        Err(err) => {
            error!("Configuration failed: {err}");
            show_config_error(&[]);
            return;
        }
    };

    let handle = booted.synchronizer.handle();
    let status = booted.synchronizer.status();
    bind_click(LOGIN_BUTTON_ID, {
        let handle = handle.clone();
        move || match status.user() {
            Some(user) => debug!(user_id = %user.id, "Already signed in"),
            None => handle.sign_in(),
        }
    });
    bind_click(LOGOUT_BUTTON_ID, {
        let handle = handle.clone();
        move || handle.sign_out()
    });
    install_visibility_recheck(handle);

    spawn_local(booted.run());
}

fn bind_click(id: &str, on_click: impl Fn() + 'static) {
    let Some(element) = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.get_element_by_id(id))
    else {
        debug!("No #{id} on this page");
        return;
    };
    let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
        event.prevent_default();
        on_click();
    });
    if element
        .add_event_listener_with_callback("click", callback.as_ref().unchecked_ref())
        .is_err()
    {
        error!("Failed to bind #{id}");
        return;
    }
    callback.forget();
}

fn install_visibility_recheck(handle: AuthHandle) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        return;
    };
    let target = document.clone();
    let callback = Closure::<dyn FnMut()>::new(move || {
        if !target.hidden() {
            handle.recheck();
        }
    });
    if document
        .add_event_listener_with_callback("visibilitychange", callback.as_ref().unchecked_ref())
        .is_ok()
    {
        callback.forget();
    }
}

fn install_error_handlers(toaster: &DomToaster) {
    let Some(window) = web_sys::window() else {
        return;
    };

    let notifier = toaster.clone();
    let on_error = Closure::<dyn FnMut(web_sys::ErrorEvent)>::new(
        move |event: web_sys::ErrorEvent| {
            report_unhandled_error(&notifier, &event.message());
        },
    );
    if window
        .add_event_listener_with_callback("error", on_error.as_ref().unchecked_ref())
        .is_ok()
    {
        on_error.forget();
    }

    let notifier = toaster.clone();
    let on_rejection = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
        report_unhandled_error(&notifier, "unhandled promise rejection");
    });
    if window
        .add_event_listener_with_callback(
            "unhandledrejection",
            on_rejection.as_ref().unchecked_ref(),
        )
        .is_ok()
    {
        on_rejection.forget();
    }
}
