//! The patch batch wire format and its validation into typed actions.
//!
//! A batch is a JSON array of [`ActionRecord`]s. Records are only checked structurally when the batch is
//! decoded. Each one is turned into a [`PatchAction`] right before it is applied, so an invalid record
//! doesn't prevent the records before it from taking effect.

use crate::error::ActionError;
use core::{convert::TryFrom, fmt};
use serde::Deserialize;
use serde_json::{Map, Value};

/// One undecoded element of a patch batch, exactly as the server sent it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub mode: Option<String>,
	#[serde(default)]
	pub selector: Option<String>,
	#[serde(default)]
	pub content: Option<String>,
	#[serde(default)]
	pub attributes: Option<Map<String, Value>>,
	#[serde(default)]
	pub tag_name: Option<String>,
	#[serde(default)]
	pub callback: Option<String>,
}

/// Decodes a response body into the records of one batch, in order.
///
/// # Errors
///
/// Iff `body` isn't a JSON array of objects with at least a string `type` each.
pub fn decode_batch(body: &str) -> Result<Vec<ActionRecord>, serde_json::Error> {
	serde_json::from_str(body)
}

/// Where new content goes relative to what's already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
	Replace,
	Append,
	Prepend,
}

impl Placement {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Placement::Replace => "replace",
			Placement::Append => "append",
			Placement::Prepend => "prepend",
		}
	}
}

impl fmt::Display for Placement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Attribute name/value pairs, in the order the server listed them.
pub type Attributes = Vec<(String, String)>;

/// A structural change to one resolved element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	/// Changes the target's child list.
	Children { placement: Placement, content: String },
	/// Inserts siblings around the target, or replaces it.
	Element { placement: Placement, content: String },
	/// Changes the target's attributes.
	///
	/// Appending and prepending never overwrite an existing attribute.
	Attributes { placement: Placement, attributes: Attributes },
	/// Replaces all attributes and renames the target.
	///
	/// The element is recreated, so references to the old node go stale.
	Tag { tag_name: String, attributes: Attributes },
}

impl Mutation {
	#[must_use]
	pub fn placement(&self) -> Placement {
		match self {
			Mutation::Children { placement, .. } | Mutation::Element { placement, .. } | Mutation::Attributes { placement, .. } => *placement,
			Mutation::Tag { .. } => Placement::Replace,
		}
	}

	#[must_use]
	pub fn mode(&self) -> &'static str {
		match self {
			Mutation::Children { .. } => "children",
			Mutation::Element { .. } => "element",
			Mutation::Attributes { .. } => "attributes",
			Mutation::Tag { .. } => "tag",
		}
	}
}

/// A validated patch action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchAction {
	Mutate { selector: String, mutation: Mutation },
	Include { callback: String },
}

impl TryFrom<ActionRecord> for PatchAction {
	type Error = ActionError;

	fn try_from(record: ActionRecord) -> Result<Self, Self::Error> {
		let ActionRecord {
			kind,
			mode,
			selector,
			content,
			attributes,
			tag_name,
			callback,
		} = record;

		// Older servers signal includes through `mode` instead of `type`.
		if kind == "include" || mode.as_deref() == Some("include") {
			return Ok(PatchAction::Include {
				callback: callback.ok_or(ActionError::MissingField { field: "callback" })?,
			});
		}

		let placement = match kind.as_str() {
			"replace" => Placement::Replace,
			"append" => Placement::Append,
			"prepend" => Placement::Prepend,
			_ => return Err(ActionError::UnsupportedCombination { kind, mode }),
		};

		let mutation = match (placement, mode.as_deref()) {
			(_, Some("children")) => Mutation::Children {
				placement,
				content: content.ok_or(ActionError::MissingField { field: "content" })?,
			},
			(_, Some("element")) => Mutation::Element {
				placement,
				content: content.ok_or(ActionError::MissingField { field: "content" })?,
			},
			(_, Some("attributes")) => Mutation::Attributes {
				placement,
				attributes: stringify_attributes(attributes.ok_or(ActionError::MissingField { field: "attributes" })?)?,
			},
			(Placement::Replace, Some("tag")) => Mutation::Tag {
				tag_name: tag_name.ok_or(ActionError::MissingField { field: "tagName" })?,
				attributes: stringify_attributes(attributes.ok_or(ActionError::MissingField { field: "attributes" })?)?,
			},
			_ => return Err(ActionError::UnsupportedCombination { kind, mode }),
		};

		Ok(PatchAction::Mutate {
			selector: selector.ok_or(ActionError::MissingField { field: "selector" })?,
			mutation,
		})
	}
}

/// Coerces attribute values the way `Element.setAttribute` would.
fn stringify_attributes(attributes: Map<String, Value>) -> Result<Attributes, ActionError> {
	attributes
		.into_iter()
		.map(|(name, value)| {
			let value = match value {
				Value::String(value) => value,
				Value::Number(number) => number.to_string(),
				Value::Bool(boolean) => boolean.to_string(),
				Value::Null | Value::Array(_) | Value::Object(_) => return Err(ActionError::MalformedAttribute { name }),
			};
			Ok((name, value))
		})
		.collect()
}
