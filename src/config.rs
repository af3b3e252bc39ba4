//! Runtime settings of a [`Fetcher`](`crate::fetch::Fetcher`).

/// Well-known path of the endpoint that produces a page's initial patch batch.
pub const SUBREQUEST_ENDPOINT: &str = "/.deliverance/subreq";

/// Include chains deeper than this are cut off by default.
pub const DEFAULT_INCLUDE_DEPTH_LIMIT: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// Application URL the subrequest endpoint is mounted under, without trailing `/`.
	///
	/// Empty means the page's origin-relative root.
	pub base_url: String,
	pub endpoint: String,
	/// Maximum number of nested `include` fetches below the initial batch.
	pub include_depth_limit: usize,
	/// Whether selector and action failures are shown on the page like transport errors are.
	///
	/// They are only logged otherwise.
	pub action_error_banner: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			base_url: String::new(),
			endpoint: SUBREQUEST_ENDPOINT.to_owned(),
			include_depth_limit: DEFAULT_INCLUDE_DEPTH_LIMIT,
			action_error_banner: false,
		}
	}
}

impl Config {
	#[must_use]
	pub fn new(base_url: impl Into<String>) -> Self {
		Self::default().with_base_url(base_url)
	}

	#[must_use]
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		let mut base_url = base_url.into();
		while base_url.ends_with('/') {
			base_url.pop();
		}
		self.base_url = base_url;
		self
	}

	#[must_use]
	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = endpoint.into();
		self
	}

	#[must_use]
	pub fn with_include_depth_limit(mut self, include_depth_limit: usize) -> Self {
		self.include_depth_limit = include_depth_limit;
		self
	}

	#[must_use]
	pub fn with_action_error_banner(mut self, action_error_banner: bool) -> Self {
		self.action_error_banner = action_error_banner;
		self
	}

	/// The location of the initial patch batch for the page at `page_url`.
	#[must_use]
	pub fn subrequest_url(&self, page_url: &str) -> String {
		format!("{}{}?url={}", self.base_url, self.endpoint, encode_uri_component(page_url))
	}
}

#[cfg(target_arch = "wasm32")]
fn encode_uri_component(component: &str) -> String {
	js_sys::encode_uri_component(component).into()
}

/// Same output as `encodeURIComponent`, for use off-Wasm.
#[cfg(not(target_arch = "wasm32"))]
fn encode_uri_component(component: &str) -> String {
	const UNRESERVED: &[u8] = b"-_.!~*'()";
	let mut encoded = String::with_capacity(component.len());
	for &byte in component.as_bytes() {
		if byte.is_ascii_alphanumeric() || UNRESERVED.contains(&byte) {
			encoded.push(byte as char);
		} else {
			encoded.push_str(&format!("%{:02X}", byte));
		}
	}
	encoded
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_endpoint() {
		let config = Config::default();
		assert_eq!(config.endpoint, "/.deliverance/subreq");
		assert_eq!(config.include_depth_limit, DEFAULT_INCLUDE_DEPTH_LIMIT);
		assert!(!config.action_error_banner);
	}

	#[test]
	fn subrequest_url_encodes_page_url() {
		let config = Config::new("http://example.com/app/");
		assert_eq!(
			config.subrequest_url("http://example.com/app/page?a=1&b=ä #top"),
			"http://example.com/app/.deliverance/subreq?url=http%3A%2F%2Fexample.com%2Fapp%2Fpage%3Fa%3D1%26b%3D%C3%A4%20%23top"
		);
	}

	#[test]
	fn subrequest_url_relative_to_root() {
		let config = Config::default().with_endpoint("/_patch");
		assert_eq!(config.subrequest_url("/x(1)!"), "/_patch?url=%2Fx(1)!");
	}
}
