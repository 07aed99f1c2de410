//! Auth feature module: the Supabase binding, the session store, and the
//! synchronizer that keeps storage, in-memory state, and page chrome in step.
//! This module handles access tokens and must never log them.
//!
//! Flow Overview: on load the stored pair is rendered first; once the SDK is up
//! the synchronizer subscribes to its events and checks for an existing
//! session, falling back to the stored pair. Sign-in hands off
//! to Google OAuth and completes as a `SIGNED_IN` event after the redirect.
//! Sign-out clears local state first and then notifies the backend.

pub mod bootstrap;
pub mod client;
pub mod session_store;
pub mod state;
#[cfg(target_arch = "wasm32")]
pub mod supabase;
pub mod types;

pub use bootstrap::{Boot, boot};
pub use client::{AuthBackend, AuthEventSink, OAuthProvider};
pub use session_store::SessionStore;
pub use state::{AuthHandle, AuthState, AuthStatus, Request, Synchronizer};
pub use types::{AuthEvent, AuthEventKind, Session, SessionToken, UserRecord};
