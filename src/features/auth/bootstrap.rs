//! Startup ordering for the auth feature. Configuration is resolved first and
//! nothing remote is created when it is incomplete. The stored session is
//! rendered next, so the page reflects it while the SDK is still loading and
//! after a failed load. The backend is created from the resolved config and
//! handed to the synchronizer, which subscribes before it checks the session.

use super::{client::AuthBackend, state::Synchronizer};
use crate::{
    app_lib::{
        AppError,
        config::{AppConfig, Resolver},
        storage::KeyValueStorage,
    },
    components::{AuthView, Notifier},
};
use std::future::Future;
use tracing::info;

/// A synchronizer showing the stored session, plus the pending backend.
pub struct Boot<B, S, V, N, F> {
    pub synchronizer: Synchronizer<B, S, V, N>,
    pub backend: F,
}

impl<B, S, V, N, F> Boot<B, S, V, N, F>
where
    B: AuthBackend,
    S: KeyValueStorage,
    V: AuthView,
    N: Notifier,
    F: Future<Output = Result<B, AppError>>,
{
    /// Connects the backend and serves requests for the lifetime of the page.
    pub async fn run(self) {
        self.synchronizer.run(self.backend).await;
    }
}

/// Resolves configuration, renders the stored session, and starts creating the
/// backend with `connect`.
///
/// # Errors
/// Returns `AppError::Config` when required keys are missing; `connect` is not
/// called in that case.
pub fn boot<B, S, V, N, C, F>(
    resolver: &Resolver,
    storage: S,
    view: V,
    notifier: N,
    connect: C,
) -> Result<Boot<B, S, V, N, F>, AppError>
where
    B: AuthBackend,
    S: KeyValueStorage,
    V: AuthView,
    N: Notifier,
    C: FnOnce(AppConfig) -> F,
    F: Future<Output = Result<B, AppError>>,
{
    let config = resolver.resolve()?;
    info!("Configuration loaded");

    let mut synchronizer = Synchronizer::new(storage, view, notifier, &config);
    synchronizer.recheck();
    let backend = connect(config);
    Ok(Boot {
        synchronizer,
        backend,
    })
}
