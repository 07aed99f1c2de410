//! Shared utilities for configuration, storage, logging, errors, and build
//! metadata.
//!
//! ## Page Lifecycle
//!
//! 1. **Config:** Every required Supabase/Google value is resolved from the page
//!    (globals, meta tags, data attributes, query string). A missing value stops
//!    the page behind a blocking overlay.
//! 2. **Client:** The Supabase SDK script is loaded and a client is created from
//!    the resolved endpoint and anon key.
//! 3. **Sync:** The auth synchronizer merges the SDK session, its event stream,
//!    and the pair kept in `localStorage`, and toggles the page accordingly.
//!
//! None of these helpers hold secrets, but callers must still keep access
//! tokens out of logs.

pub mod build_info;
pub mod config;
pub mod errors;
pub mod logging;
pub mod storage;

pub use errors::AppError;
