//! Browser glue for the AI-Day event site.
//!
//! The static pages load this crate as WebAssembly. It resolves the runtime
//! configuration, keeps the Supabase auth session, `localStorage`, and the
//! login-dependent page chrome in sync, and shows toast notifications. All
//! DOM, storage, and SDK access sits behind small traits so the state logic
//! runs and is tested natively.

#[cfg(target_arch = "wasm32")]
mod app;
#[path = "lib/mod.rs"]
pub mod app_lib;
pub mod components;
pub mod features;

pub use app_lib::AppError;

/// Entry point run by the generated JS glue once the module is instantiated.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    app::start();
}
