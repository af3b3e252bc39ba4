//! Fetching patch batches and dispatching their actions.
//!
//! Everything here runs on the page's single thread. A batch is applied to completion inside the callback
//! that delivers its response, so two batches never interleave. `include` actions start further batches
//! without waiting for them.

use crate::{
	action::{decode_batch, PatchAction},
	apply::apply,
	config::Config,
	error::{js_message, BatchError, TransportError},
	selector::resolve,
};
use core::{
	cell::{Cell, RefCell},
	convert::TryFrom,
};
use std::rc::Rc;
use tracing::{error, info, info_span, instrument, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast};

/// A completed HTTP exchange. `status` is `0` if no response was received at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
	pub status: u16,
	pub body: String,
}

/// Issues GET requests for patch batches.
pub trait Transport {
	/// Requests `location` and calls `on_complete` exactly once when the request finishes, successful or not.
	///
	/// `on_complete` should not be called before this method returns, so that the batch isn't applied
	/// while the caller is still issuing requests. Doing so anyway is tolerated.
	///
	/// # Errors
	///
	/// Iff the request couldn't be issued. `on_complete` is then never called.
	fn get(&self, location: &str, on_complete: Box<dyn FnOnce(Response)>) -> Result<(), TransportError>;
}

/// [`Transport`] over the browser's `XMLHttpRequest`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XhrTransport;

impl Transport for XhrTransport {
	#[instrument(skip(self, on_complete))]
	fn get(&self, location: &str, on_complete: Box<dyn FnOnce(Response)>) -> Result<(), TransportError> {
		let send_error = |error| TransportError::Send {
			location: location.to_owned(),
			message: js_message(&error),
		};

		let request = web_sys::XmlHttpRequest::new().map_err(send_error)?;
		request.open_with_async("GET", location, true).map_err(send_error)?;

		let handle = request.clone();
		// Frees itself after the single call. A request that never completes leaks it, which is fine as there's no cancellation.
		let on_loadend = Closure::once_into_js(move || {
			let status = handle.status().unwrap_or(0);
			let body = handle.response_text().ok().flatten().unwrap_or_default();
			on_complete(Response { status, body });
		});
		request.set_onloadend(Some(on_loadend.unchecked_ref()));
		request.send().map_err(send_error)
	}
}

/// How a batch ended.
#[derive(Debug)]
pub struct BatchOutcome {
	pub location: String,
	/// `0` for batches started directly, plus one per `include` level.
	pub depth: usize,
	/// The number of actions processed (including `include`s), or why the batch stopped.
	pub result: Result<usize, BatchError>,
}

type Observer = Rc<dyn Fn(&BatchOutcome)>;

/// Fetches patch batches and applies them to one document.
///
/// Clones share the same document, configuration, transport and pending request count.
#[derive(Clone)]
pub struct Fetcher {
	shared: Rc<Shared>,
}

struct Shared {
	document: web_sys::Document,
	config: Config,
	transport: Box<dyn Transport>,
	pending: Cell<usize>,
	observer: RefCell<Option<Observer>>,
}

impl core::fmt::Debug for Fetcher {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("Fetcher")
			.field("config", &self.shared.config)
			.field("pending", &self.shared.pending.get())
			.finish_non_exhaustive()
	}
}

impl Fetcher {
	#[must_use]
	pub fn new(document: web_sys::Document, config: Config, transport: impl 'static + Transport) -> Self {
		Self {
			shared: Rc::new(Shared {
				document,
				config,
				transport: Box::new(transport),
				pending: Cell::new(0),
				observer: RefCell::new(None),
			}),
		}
	}

	#[must_use]
	pub fn config(&self) -> &Config {
		&self.shared.config
	}

	/// The number of requests issued whose batches haven't been processed yet.
	#[must_use]
	pub fn pending(&self) -> usize {
		self.shared.pending.get()
	}

	/// Registers a callback that's told about each batch once it's done, replacing any previous one.
	pub fn set_observer(&self, observer: impl 'static + Fn(&BatchOutcome)) {
		*self.shared.observer.borrow_mut() = Some(Rc::new(observer));
	}

	/// Starts the page's initial batch, from [`Config::subrequest_url`] for the document's URL.
	///
	/// # Errors
	///
	/// Iff the request couldn't be issued.
	#[instrument]
	pub fn start_for_page(&self) -> Result<(), TransportError> {
		let page_url = self.shared.document.url().map_err(|error| TransportError::Send {
			location: self.shared.config.subrequest_url(""),
			message: js_message(&error),
		})?;
		self.start(&self.shared.config.subrequest_url(&page_url))
	}

	/// Fetches the batch at `location` and applies it once the response arrives.
	///
	/// # Errors
	///
	/// Iff the request couldn't be issued.
	pub fn start(&self, location: &str) -> Result<(), TransportError> {
		self.start_at_depth(location, 0)
	}

	#[instrument]
	fn start_at_depth(&self, location: &str, depth: usize) -> Result<(), TransportError> {
		let this = self.clone();
		let owned_location = location.to_owned();
		// Counted before `get`, which may already have completed the request when it returns.
		self.shared.pending.set(self.shared.pending.get() + 1);
		let issued = self.shared.transport.get(
			location,
			Box::new(move |response| {
				this.shared.pending.set(this.shared.pending.get().saturating_sub(1));
				let result = this.process(&owned_location, depth, response);
				this.finish(BatchOutcome {
					location: owned_location,
					depth,
					result,
				});
			}),
		);
		if let Err(error) = issued {
			self.shared.pending.set(self.shared.pending.get().saturating_sub(1));
			return Err(error);
		}
		trace!("Request issued.");
		Ok(())
	}

	/// Applies one response. Stops at the first failing action.
	fn process(&self, location: &str, depth: usize, response: Response) -> Result<usize, BatchError> {
		let span = info_span!("Processing batch", location, depth, status = response.status);
		let _enter = span.enter();

		if response.status != 200 {
			let error = TransportError::Status {
				location: location.to_owned(),
				status: response.status,
			};
			if response.body.is_empty() {
				self.show_text_banner(&error.to_string());
			} else {
				self.show_markup_banner(&response.body);
			}
			return Err(error.into());
		}

		let records = decode_batch(&response.body)?;
		let count = records.len();
		trace!("Decoded {} action record(s).", count);

		for (index, record) in records.into_iter().enumerate() {
			let action = PatchAction::try_from(record).map_err(|source| BatchError::Action { index, source })?;
			match action {
				PatchAction::Include { callback } => {
					let span = trace_span!("Including", index, callback = callback.as_str());
					let _enter = span.enter();
					if depth >= self.shared.config.include_depth_limit {
						return Err(BatchError::IncludeDepthLimit {
							location: callback,
							limit: self.shared.config.include_depth_limit,
						});
					}
					self.start_at_depth(&callback, depth + 1)?;
				}
				PatchAction::Mutate { selector, mutation } => {
					let span = trace_span!("Mutating", index, selector = selector.as_str(), placement = %mutation.placement(), mode = mutation.mode());
					let _enter = span.enter();
					let target = resolve(&selector, &self.shared.document)
						.map_err(|source| BatchError::Selector { index, source })?;
					apply(&self.shared.document, &mutation, &target).map_err(|source| BatchError::Action { index, source })?;
				}
			}
		}

		Ok(count)
	}

	fn finish(&self, outcome: BatchOutcome) {
		match &outcome.result {
			Ok(count) => info!("Processed {} action(s) from {}.", count, outcome.location),
			Err(error) => {
				error!("Aborted batch from {}: {}", outcome.location, error);
				if self.shared.config.action_error_banner && error.action_index().is_some() {
					self.show_text_banner(&error.to_string());
				}
			}
		}

		let observer = self.shared.observer.borrow().clone();
		if let Some(observer) = observer {
			observer(&outcome);
		}
	}

	fn show_markup_banner(&self, markup: &str) {
		if let Some(banner) = self.insert_banner() {
			banner.set_inner_html(markup);
		}
	}

	fn show_text_banner(&self, text: &str) {
		if let Some(banner) = self.insert_banner() {
			let node: &web_sys::Node = banner.as_ref();
			node.set_text_content(Some(text));
		}
	}

	/// Inserts an empty `<div>` at the very start of `<body>`.
	fn insert_banner(&self) -> Option<web_sys::Element> {
		let document = &self.shared.document;
		let body = match document.body() {
			Some(body) => body,
			None => {
				warn!("No <body> to show the error banner in.");
				return None;
			}
		};
		let banner = match document.create_element("div") {
			Ok(banner) => banner,
			Err(error) => {
				error!("Failed to create error banner: {:?}", error);
				return None;
			}
		};
		let body_node: &web_sys::Node = body.as_ref();
		if let Err(error) = body_node.insert_before(banner.as_ref(), body_node.first_child().as_ref()) {
			error!("Failed to insert error banner: {:?}", error);
			return None;
		}
		Some(banner)
	}
}
