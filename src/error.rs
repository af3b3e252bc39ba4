//! Error types, one per stage a patch batch passes through.
//!
//! Any of these aborts the batch it occurs in. None of them is fatal to the page or to other batches.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// A selector could not be resolved to exactly one element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
	#[error("No element with id {id:?}")]
	NotFound { id: String },

	#[error("Nothing found for selector {selector:?} segment {segment:?}")]
	SegmentNotFound { selector: String, segment: String },

	#[error("Selector {selector:?} failed at segment {segment_index}")]
	PathBroken { selector: String, segment_index: usize },

	#[error("Unknown selector: {selector:?}")]
	UnknownSyntax { selector: String },
}

/// An action record could not be validated or its mutation could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
	#[error("Unsupported action type/mode combination: {kind:?}/{mode:?}")]
	UnsupportedCombination { kind: String, mode: Option<String> },

	#[error("Action is missing required field `{field}`")]
	MissingField { field: &'static str },

	#[error("Attribute {name:?} has a value that is not a string, number or boolean")]
	MalformedAttribute { name: String },

	#[error("Target element has no parent node")]
	Detached,

	#[error("DOM operation `{operation}` failed: {message}")]
	Dom { operation: &'static str, message: String },
}

impl ActionError {
	pub(crate) fn dom(operation: &'static str, error: &JsValue) -> Self {
		Self::Dom {
			operation,
			message: js_message(error),
		}
	}
}

/// Best-effort text of a thrown JavaScript value.
pub(crate) fn js_message(error: &JsValue) -> String {
	error.as_string().unwrap_or_else(|| format!("{:?}", error))
}

/// A batch could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
	#[error("Request to {location} failed with status {status}")]
	Status { location: String, status: u16 },

	#[error("Request to {location} could not be sent: {message}")]
	Send { location: String, message: String },
}

/// Why a batch stopped early.
#[derive(Debug, Error)]
pub enum BatchError {
	#[error(transparent)]
	Transport(#[from] TransportError),

	#[error("Malformed patch batch: {0}")]
	Decode(#[from] serde_json::Error),

	#[error("Action {index}: {source}")]
	Selector { index: usize, source: SelectorError },

	#[error("Action {index}: {source}")]
	Action { index: usize, source: ActionError },

	#[error("Include depth limit ({limit}) reached at {location}")]
	IncludeDepthLimit { location: String, limit: usize },
}

impl BatchError {
	/// Index of the failing action within its batch, if the failure is tied to one.
	#[must_use]
	pub fn action_index(&self) -> Option<usize> {
		match self {
			Self::Selector { index, .. } | Self::Action { index, .. } => Some(*index),
			Self::Transport(_) | Self::Decode(_) | Self::IncludeDepthLimit { .. } => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn selector_messages_name_the_selector() {
		let error = SelectorError::SegmentNotFound {
			selector: "/HTML/BODY/ASIDE".to_owned(),
			segment: "ASIDE".to_owned(),
		};
		let display = error.to_string();
		assert!(display.contains("/HTML/BODY/ASIDE"));
		assert!(display.contains("ASIDE"));
	}

	#[test]
	fn batch_error_carries_action_index() {
		let error = BatchError::Selector {
			index: 3,
			source: SelectorError::NotFound { id: "missing".to_owned() },
		};
		assert_eq!(error.action_index(), Some(3));
		assert_eq!(error.to_string(), "Action 3: No element with id \"missing\"");
	}

	#[test]
	fn transport_error_is_not_tied_to_an_action() {
		let error: BatchError = TransportError::Status {
			location: "/next".to_owned(),
			status: 404,
		}
		.into();
		assert_eq!(error.action_index(), None);
		assert_eq!(error.to_string(), "Request to /next failed with status 404");
	}
}
