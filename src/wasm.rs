use wasm_bindgen::prelude::*;

use crate::config::AppConfig;
use crate::geometry::normalize_value;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let level = AppConfig::load_from_local_storage()
        .unwrap_or_default()
        .preferences
        .log_level
        .to_level_filter()
        .to_level()
        .unwrap_or(log::Level::Error);
    if let Err(e) = console_log::init_with_level(level) {
        web_sys::console::log_1(&format!("Logger already initialized: {}", e).into());
    }
    log::info!("XDental core loaded");
}

/// Normalize a finding given as JSON; returns the box as JSON or `null`.
#[wasm_bindgen(js_name = normalizeFinding)]
pub fn normalize_finding(json: &str) -> String {
    let normalized = serde_json::from_str(json)
        .ok()
        .and_then(|value| normalize_value(&value));
    serde_json::to_string(&normalized).unwrap_or_else(|_| "null".to_string())
}
