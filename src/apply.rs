//! Carries out a single [`Mutation`] on a resolved element.
//!
//! Changes are applied directly to the live DOM and can't be undone. Attribute mutations that fail halfway
//! leave the attributes set so far in place.

use crate::{
	action::{Attributes, Mutation, Placement},
	error::ActionError,
	loggable,
};
use tracing::{instrument, trace, trace_span};
use wasm_bindgen::JsCast;

/// Applies `mutation` to `target`, which must belong to `document`.
///
/// # Errors
///
/// - [`ActionError::Detached`] if `mutation` inserts siblings of, replaces or renames a `target` without parent.
/// - [`ActionError::Dom`] if the DOM rejects an operation, e.g. an invalid attribute or tag name.
#[instrument(skip(document, mutation, target), fields(placement = %mutation.placement(), mode = mutation.mode(), target = %target.tag_name()))]
pub fn apply(document: &web_sys::Document, mutation: &Mutation, target: &web_sys::Element) -> Result<(), ActionError> {
	match mutation {
		Mutation::Children { placement, content } => {
			let span = trace_span!("Updating children", content = loggable(content));
			let _enter = span.enter();
			match placement {
				Placement::Replace => target.set_inner_html(content),
				Placement::Append => target.set_inner_html(&(target.inner_html() + content)),
				Placement::Prepend => target.set_inner_html(&(content.clone() + &target.inner_html())),
			}
			Ok(())
		}

		Mutation::Element { placement, content } => {
			let span = trace_span!("Updating element", content = loggable(content));
			let _enter = span.enter();
			let parent = target.parent_node().ok_or(ActionError::Detached)?;
			let target_node: &web_sys::Node = target.as_ref();
			let fragment = parse_fragment(document, content)?;
			trace!("Parsed {} node(s).", fragment.child_nodes().length());

			match placement {
				Placement::Replace => {
					parent.insert_before(&fragment, Some(target_node)).map_err(|error| ActionError::dom("insertBefore", &error))?;
					parent.remove_child(target_node).map_err(|error| ActionError::dom("removeChild", &error))?;
				}
				Placement::Append => {
					let next_sibling = target_node.next_sibling();
					parent.insert_before(&fragment, next_sibling.as_ref()).map_err(|error| ActionError::dom("insertBefore", &error))?;
				}
				Placement::Prepend => {
					parent.insert_before(&fragment, Some(target_node)).map_err(|error| ActionError::dom("insertBefore", &error))?;
				}
			}
			Ok(())
		}

		Mutation::Attributes { placement, attributes } => match placement {
			Placement::Replace => {
				clear_attributes(target)?;
				set_attributes(target, attributes)
			}
			Placement::Append | Placement::Prepend => add_missing_attributes(target, attributes),
		},

		Mutation::Tag { tag_name, attributes } => {
			let parent = target.parent_node().ok_or(ActionError::Detached)?;
			let renamed = rename(document, target, tag_name)?;
			set_attributes(&renamed, attributes)?;

			let span = trace_span!("Moving children", count = target.child_nodes().length());
			let _enter = span.enter();
			let renamed_node: &web_sys::Node = renamed.as_ref();
			let target_node: &web_sys::Node = target.as_ref();
			while let Some(child) = target_node.first_child() {
				renamed_node.append_child(&child).map_err(|error| ActionError::dom("appendChild", &error))?;
			}
			parent.replace_child(renamed_node, target_node).map_err(|error| ActionError::dom("replaceChild", &error))?;
			trace!("Replaced <{}> with <{}>.", target.tag_name(), renamed.tag_name());
			Ok(())
		}
	}
}

/// Parses `content` as markup into a detached fragment.
///
/// A `<template>` is used as parsing context so that fragments like `<tr>` or `<li>` survive,
/// and so that nothing in `content` runs or loads while it's detached.
fn parse_fragment(document: &web_sys::Document, content: &str) -> Result<web_sys::DocumentFragment, ActionError> {
	let template = document
		.create_element("template")
		.map_err(|error| ActionError::dom("createElement", &error))?
		.dyn_into::<web_sys::HtmlTemplateElement>()
		.map_err(|element| ActionError::Dom {
			operation: "createElement",
			message: format!("Expected <template> but got <{}>", element.tag_name()),
		})?;
	template.set_inner_html(content);
	Ok(template.content())
}

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Creates an empty element named `tag_name` in the same namespace as `original`.
///
/// HTML element names are lower-cased, since `createElementNS` keeps them as given and `<A>` wouldn't be an anchor.
/// Names in other namespaces (SVG, MathML) are case-sensitive and used unchanged.
fn rename(document: &web_sys::Document, original: &web_sys::Element, tag_name: &str) -> Result<web_sys::Element, ActionError> {
	let namespace = original.namespace_uri();
	let created = if namespace.as_deref() == Some(XHTML_NAMESPACE) {
		document.create_element_ns(Some(XHTML_NAMESPACE), &tag_name.to_ascii_lowercase())
	} else {
		document.create_element_ns(namespace.as_deref(), tag_name)
	};
	created.map_err(|error| ActionError::dom("createElementNS", &error))
}

#[instrument(skip(element))]
fn clear_attributes(element: &web_sys::Element) -> Result<(), ActionError> {
	let attributes = element.attributes();
	while let Some(attribute) = attributes.item(0) {
		element.remove_attribute_node(&attribute).map_err(|error| ActionError::dom("removeAttributeNode", &error))?;
	}
	Ok(())
}

fn set_attributes(element: &web_sys::Element, attributes: &Attributes) -> Result<(), ActionError> {
	for (name, value) in attributes {
		trace!(name = %name, value = loggable(value), "Setting attribute.");
		element.set_attribute(name, value).map_err(|error| ActionError::dom("setAttribute", &error))?;
	}
	Ok(())
}

fn add_missing_attributes(element: &web_sys::Element, attributes: &Attributes) -> Result<(), ActionError> {
	for (name, value) in attributes {
		if element.has_attribute(name) {
			trace!(name = %name, "Keeping existing attribute.");
			continue;
		}
		trace!(name = %name, value = loggable(value), "Adding attribute.");
		element.set_attribute(name, value).map_err(|error| ActionError::dom("setAttribute", &error))?;
	}
	Ok(())
}
