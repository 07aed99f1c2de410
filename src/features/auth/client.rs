//! Seam between the synchronizer and the hosted auth service. The browser build
//! talks to the Supabase JS SDK (see `supabase`); tests plug in fakes. The
//! backend owns sessions, OAuth redirects, and token refresh; this side only
//! asks and listens.

use super::types::{AuthEvent, Session};
use crate::app_lib::AppError;
use async_trait::async_trait;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
}

impl OAuthProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
        }
    }
}

/// Receives auth state events from the backend subscription.
pub struct AuthEventSink(Box<dyn Fn(AuthEvent)>);

impl AuthEventSink {
    pub fn new(emit: impl Fn(AuthEvent) + 'static) -> Self {
        Self(Box::new(emit))
    }

    pub fn emit(&self, event: AuthEvent) {
        (self.0)(event);
    }
}

#[async_trait(?Send)]
pub trait AuthBackend {
    /// Current session, `None` when signed out.
    async fn get_session(&self) -> Result<Option<Session>, AppError>;

    /// Starts the OAuth flow. Redirect-based providers return `Ok(None)`; the
    /// session then arrives as a `SignedIn` event after the round trip.
    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<Option<Session>, AppError>;

    /// Invalidates the session on the backend.
    async fn sign_out(&self) -> Result<(), AppError>;

    /// Registers the single listener for auth state events.
    ///
    /// # Errors
    /// Returns an error if the backend refuses the listener.
    fn subscribe(&self, sink: AuthEventSink) -> Result<(), AppError>;
}

#[async_trait(?Send)]
impl<T: AuthBackend + ?Sized> AuthBackend for Rc<T> {
    async fn get_session(&self) -> Result<Option<Session>, AppError> {
        (**self).get_session().await
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<Option<Session>, AppError> {
        (**self).sign_in_with_oauth(provider, redirect_to).await
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        (**self).sign_out().await
    }

    fn subscribe(&self, sink: AuthEventSink) -> Result<(), AppError> {
        (**self).subscribe(sink)
    }
}
