#![doc(html_root_url = "https://docs.rs/deliverance-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod action;
pub mod apply;
pub mod config;
pub mod error;
pub mod fetch;
pub mod selector;

pub use action::{ActionRecord, Mutation, PatchAction, Placement};
pub use config::Config;
pub use error::{ActionError, BatchError, SelectorError, TransportError};
pub use fetch::{BatchOutcome, Fetcher, Transport, XhrTransport};
pub use selector::{resolve, Selector};

use wasm_bindgen::{prelude::wasm_bindgen, JsValue};

/// Starts patching the current page: Fetches its initial batch from `base_url` (or the site root) and applies it.
///
/// # Errors
///
/// Iff there's no current document or the first request couldn't be issued.
#[wasm_bindgen]
pub fn attach(base_url: Option<String>) -> Result<(), JsValue> {
	#[cfg(feature = "console-subscriber")]
	{
		static SUBSCRIBER: std::sync::Once = std::sync::Once::new();
		SUBSCRIBER.call_once(tracing_wasm::set_as_global_default);
	}

	let document = web_sys::window()
		.and_then(|window| window.document())
		.ok_or_else(|| JsValue::from_str("deliverance-dom: No current document."))?;
	let config = base_url.map_or_else(Config::default, Config::new);

	Fetcher::new(document, config, XhrTransport)
		.start_for_page()
		.map_err(|error| JsValue::from_str(&error.to_string()))
}

/// Markup and attribute values may contain personal data, so they only appear in logs with `dangerous-logging`.
pub(crate) fn loggable(value: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		value
	} else {
		"[redacted]"
	}
}
