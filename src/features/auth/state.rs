//! Auth state synchronizer. It merges three signals into one in-memory state:
//! the SDK's auth event stream, the session the SDK already holds at startup,
//! and the pair kept in the session store. SDK callbacks and UI actions are
//! queued as `Request`s and handled one at a time in arrival order, so the
//! startup check and a `SIGNED_IN` event describing the same login converge on
//! one state with one welcome notice.
//!
//! Storage and in-memory state never disagree: whenever a write fails or the
//! backend errors, the outcome is "signed out, storage cleared". Sign-out is
//! local-first; the backend is told afterwards and its failure is only logged.
//!
//! The synchronizer exists before the backend does. Until the SDK is loaded it
//! follows the session store alone, and it keeps doing so if loading fails.

use super::{
    client::{AuthBackend, AuthEventSink, OAuthProvider},
    session_store::SessionStore,
    types::{AuthEvent, AuthEventKind, Session, SessionToken, UserRecord},
};
use crate::{
    app_lib::{AppError, config::AppConfig, storage::KeyValueStorage},
    components::{AuthView, Notifier, ToastKind},
};
use futures::{
    StreamExt,
    channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded},
};
use std::{cell::RefCell, future::Future, rc::Rc};
use tracing::{debug, error, info, warn};

pub const SIGNED_OUT_MESSAGE: &str = "Signed out successfully";
pub const REMOTE_SIGNED_OUT_MESSAGE: &str = "You have been signed out";
pub const SIGN_IN_FAILED_MESSAGE: &str = "Google sign-in failed, please try again";
pub const SIGN_IN_INCOMPLETE_MESSAGE: &str = "Sign-in could not be completed";
pub const SESSION_SAVE_FAILED_MESSAGE: &str = "Your sign-in could not be saved on this device";
pub const BACKEND_UNAVAILABLE_MESSAGE: &str = "The sign-in service is unavailable right now";

#[must_use]
pub fn welcome_message(display_name: &str) -> String {
    format!("Welcome back, {display_name}!")
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Initializing,
    Unauthenticated,
    Authenticated(UserRecord),
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Read-only view of the synchronizer's state for other components.
#[derive(Clone, Debug)]
pub struct AuthStatus(Rc<RefCell<AuthState>>);

impl AuthStatus {
    #[must_use]
    pub fn user(&self) -> Option<UserRecord> {
        self.0.borrow().user().cloned()
    }
}

/// Work items for the synchronizer loop.
#[derive(Debug)]
pub enum Request {
    Remote(AuthEvent),
    SignIn,
    SignOut,
    /// Re-read the session store, e.g. when the tab becomes visible again.
    Recheck,
}

/// Cloneable sender used by UI callbacks and the SDK subscription.
#[derive(Clone, Debug)]
pub struct AuthHandle {
    tx: UnboundedSender<Request>,
}

impl AuthHandle {
    pub fn sign_in(&self) {
        self.send(Request::SignIn);
    }

    pub fn sign_out(&self) {
        self.send(Request::SignOut);
    }

    pub fn recheck(&self) {
        self.send(Request::Recheck);
    }

    pub fn send(&self, request: Request) {
        if self.tx.unbounded_send(request).is_err() {
            warn!("Auth synchronizer is no longer running");
        }
    }

    /// Sink that forwards SDK events into the queue.
    #[must_use]
    pub fn event_sink(&self) -> AuthEventSink {
        let handle = self.clone();
        AuthEventSink::new(move |event| handle.send(Request::Remote(event)))
    }
}

pub struct Synchronizer<B, S, V, N> {
    backend: Option<B>,
    store: SessionStore<S>,
    view: V,
    notifier: N,
    redirect_url: String,
    state: Rc<RefCell<AuthState>>,
    tx: UnboundedSender<Request>,
    rx: Option<UnboundedReceiver<Request>>,
}

impl<B, S, V, N> Synchronizer<B, S, V, N>
where
    B: AuthBackend,
    S: KeyValueStorage,
    V: AuthView,
    N: Notifier,
{
    /// Creates a synchronizer with no backend yet; see `connect`.
    pub fn new(storage: S, view: V, notifier: N, config: &AppConfig) -> Self {
        let (tx, rx) = unbounded();
        Self {
            backend: None,
            store: SessionStore::new(storage),
            view,
            notifier,
            redirect_url: config.redirect_url.clone(),
            state: Rc::new(RefCell::new(AuthState::Initializing)),
            tx,
            rx: Some(rx),
        }
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        AuthStatus(Rc::clone(&self.state))
    }

    #[must_use]
    pub fn handle(&self) -> AuthHandle {
        AuthHandle {
            tx: self.tx.clone(),
        }
    }

    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Adopts the backend once it is available: subscribes to its events, then
    /// settles the initial state. Without a backend the stored session stays in
    /// charge and sign-in reports the service as unavailable.
    pub async fn connect(&mut self, backend: Result<B, AppError>) {
        let backend = match backend {
            Ok(backend) => backend,
            Err(err) => {
                error!("Auth backend unavailable, following stored session: {err}");
                if self.state() == AuthState::Initializing {
                    self.recheck();
                }
                self.notifier
                    .show(BACKEND_UNAVAILABLE_MESSAGE, ToastKind::Error);
                return;
            }
        };
        if let Err(err) = backend.subscribe(self.handle().event_sink()) {
            error!("Failed to subscribe to auth events: {err}");
        }
        self.backend = Some(backend);
        self.initialize().await;
    }

    /// Waits for the backend, then processes queued requests for the lifetime
    /// of the page. Requests sent while the backend loads are kept in order.
    pub async fn run(mut self, backend: impl Future<Output = Result<B, AppError>>) {
        self.connect(backend.await).await;
        let Some(mut rx) = self.rx.take() else {
            return;
        };
        while let Some(request) = rx.next().await {
            self.process(request).await;
        }
    }

    /// Processes every request queued so far without waiting for more.
    pub async fn drain(&mut self) {
        while let Some(request) = self.next_queued() {
            self.process(request).await;
        }
    }

    fn next_queued(&mut self) -> Option<Request> {
        self.rx.as_mut()?.try_recv().ok()
    }

    pub async fn process(&mut self, request: Request) {
        match request {
            Request::Remote(event) => self.handle_event(event),
            Request::SignIn => {
                self.sign_in().await;
            }
            Request::SignOut => self.sign_out().await,
            Request::Recheck => self.recheck(),
        }
    }

    /// Startup: an existing SDK session wins, then the stored pair, otherwise
    /// signed out.
    pub async fn initialize(&mut self) {
        let Some(backend) = self.backend.as_ref() else {
            self.recheck();
            return;
        };
        let remote = backend.get_session().await;
        match remote {
            Ok(Some(session)) => match session.credentials() {
                Some((record, token)) => {
                    info!(user_id = %record.id, "Found existing session");
                    self.apply_session(record, token, true);
                    return;
                }
                None => warn!("Ignoring existing session without id, email, or token"),
            },
            Ok(None) => debug!("No existing session"),
            Err(err) => {
                warn!("Session check failed, treating as signed out: {err}");
                self.store.clear();
                self.set_unauthenticated();
                return;
            }
        }

        match self.store.load() {
            Some((record, _)) => {
                info!(user_id = %record.id, "Restored session from storage");
                self.set_authenticated(record);
            }
            None => {
                debug!("No stored session");
                self.set_unauthenticated();
            }
        }
    }

    pub fn handle_event(&mut self, event: AuthEvent) {
        debug!(kind = ?event.kind, has_session = event.session.is_some(), "Auth event");
        match event.kind {
            AuthEventKind::SignedIn => self.on_signed_in(event.session.as_ref()),
            AuthEventKind::SignedOut => self.on_signed_out(),
            AuthEventKind::TokenRefreshed => self.on_token_refreshed(event.session.as_ref()),
            AuthEventKind::UserUpdated => self.on_user_updated(event.session.as_ref()),
        }
    }

    fn on_signed_in(&mut self, session: Option<&Session>) {
        match session.and_then(Session::credentials) {
            Some((record, token)) => self.apply_session(record, token, true),
            None => {
                error!("Signed-in event without a usable session");
                self.notifier
                    .show(SIGN_IN_INCOMPLETE_MESSAGE, ToastKind::Error);
            }
        }
    }

    fn on_signed_out(&mut self) {
        if !self.state.borrow().is_authenticated() {
            debug!("Already signed out, ignoring signed-out event");
            return;
        }
        info!("Signed out by auth backend");
        self.store.clear();
        self.set_unauthenticated();
        self.notifier.show(REMOTE_SIGNED_OUT_MESSAGE, ToastKind::Info);
    }

    /// A refreshed session with a full user replaces the stored pair. A bare
    /// token is only kept when the session names the signed-in user.
    fn on_token_refreshed(&mut self, session: Option<&Session>) {
        let Some(current) = self.state.borrow().user().cloned() else {
            debug!("Ignoring token refresh while signed out");
            return;
        };
        let Some(session) = session else {
            warn!("Token refresh without a session");
            return;
        };
        if let Some((record, token)) = session.credentials() {
            self.apply_session(record, token, false);
            return;
        }
        let same_user = session
            .user
            .as_ref()
            .is_some_and(|user| user.id.trim() == current.id);
        match session.token() {
            Some(token) if same_user => self.apply_session(current, token, false),
            _ => warn!("Ignoring token refresh that does not match the signed-in user"),
        }
    }

    fn on_user_updated(&mut self, session: Option<&Session>) {
        if !self.state.borrow().is_authenticated() {
            debug!("Ignoring user update while signed out");
            return;
        }
        match session.and_then(Session::credentials) {
            Some((record, token)) => self.apply_session(record, token, false),
            None => warn!("User update without a usable session"),
        }
    }

    /// Starts the Google OAuth flow. Returns `false` on failure; nothing is
    /// written in that case.
    pub async fn sign_in(&mut self) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            warn!("Sign-in requested without an auth backend");
            self.notifier
                .show(BACKEND_UNAVAILABLE_MESSAGE, ToastKind::Error);
            return false;
        };
        let outcome = backend
            .sign_in_with_oauth(OAuthProvider::Google, &self.redirect_url)
            .await;
        match outcome {
            Ok(None) => {
                info!("OAuth sign-in started");
                true
            }
            Ok(Some(session)) => match session.credentials() {
                Some((record, token)) => {
                    self.apply_session(record, token, true);
                    self.state.borrow().is_authenticated()
                }
                None => {
                    error!("Sign-in returned a session without id, email, or token");
                    self.notifier.show(SIGN_IN_FAILED_MESSAGE, ToastKind::Error);
                    false
                }
            },
            Err(err) => {
                error!("Google sign-in failed: {err}");
                self.notifier.show(SIGN_IN_FAILED_MESSAGE, ToastKind::Error);
                false
            }
        }
    }

    /// Clears local state unconditionally, then asks the backend to drop the
    /// session. A backend failure does not undo the local sign-out.
    pub async fn sign_out(&mut self) {
        info!("Signing out");
        self.store.clear();
        self.set_unauthenticated();
        self.notifier.show(SIGNED_OUT_MESSAGE, ToastKind::Success);

        let Some(backend) = self.backend.as_ref() else {
            debug!("No auth backend, skipping remote sign-out");
            return;
        };
        if let Err(err) = backend.sign_out().await {
            warn!("Remote sign-out failed, local session already cleared: {err}");
        }
    }

    /// Re-reads the store and follows it silently. Also renders the stored
    /// session before the backend is connected.
    pub fn recheck(&mut self) {
        let stored = self.store.load().map(|(record, _)| record);
        let current = self.state();
        match (stored, current) {
            (Some(record), AuthState::Authenticated(current)) if record == current => {}
            (Some(record), _) => {
                debug!(user_id = %record.id, "Store holds a session, updating view");
                self.set_authenticated(record);
            }
            (None, AuthState::Unauthenticated) => {}
            (None, _) => {
                debug!("Store is empty, showing signed-out view");
                self.set_unauthenticated();
            }
        }
    }

    /// Persists and adopts a session. Re-applying the current session is a
    /// no-op apart from storing a changed token.
    fn apply_session(&mut self, record: UserRecord, token: SessionToken, welcome: bool) {
        let unchanged = self.state.borrow().user() == Some(&record);
        if unchanged && self.store.load() == Some((record.clone(), token.clone())) {
            debug!(user_id = %record.id, "Session already applied");
            return;
        }

        if let Err(err) = self.store.save(&record, &token) {
            error!("Failed to persist session: {err}");
            self.store.clear();
            self.set_unauthenticated();
            self.notifier
                .show(SESSION_SAVE_FAILED_MESSAGE, ToastKind::Error);
            return;
        }
        if unchanged {
            debug!(user_id = %record.id, "Stored refreshed token");
            return;
        }

        info!(user_id = %record.id, "Signed in");
        let display_name = record.display_name.clone();
        self.set_authenticated(record);

        if welcome {
            self.notifier
                .show(&welcome_message(&display_name), ToastKind::Success);
            if self.view.current_path().contains("login") {
                self.view.navigate(&self.redirect_url);
            }
        }
    }

    fn set_authenticated(&mut self, record: UserRecord) {
        self.view.show_authenticated(&record);
        *self.state.borrow_mut() = AuthState::Authenticated(record);
    }

    fn set_unauthenticated(&mut self) {
        *self.state.borrow_mut() = AuthState::Unauthenticated;
        self.view.show_unauthenticated();
    }
}
