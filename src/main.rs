//! Taskboard Frontend Entry Point

mod anomaly;
mod api;
mod app;
mod board;
mod cache;
mod components;
mod config;
mod context;
mod error;
mod models;
mod notify;
mod query;
mod reconcile;
mod session;
mod store;
mod validation;

#[cfg(test)]
mod tests;

use app::App;
use config::AppConfig;
use leptos::prelude::*;

fn main() {
    console_error_panic_hook::set_once();

    let (mut config, errors) = AppConfig::from_build_env();
    if let Err(err) = console_logger::init(config.log_level, config.log_buffer) {
        web_sys::console::error_1(&format!("logger init failed: {}", err).into());
    }
    for err in errors {
        log::warn!("[CONFIG] {}, using default", err);
    }
    if let Some(origin) = web_sys::window().and_then(|w| w.location().origin().ok()) {
        config.resolve_base_url(&origin);
    }

    mount_to_body(move || view! { <App config=config /> });
}
