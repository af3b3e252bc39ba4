//! Selector parsing and resolution against a live [`web_sys::Document`].
//!
//! Two addressing schemes exist, told apart by the first character:
//!
//! - `#name` looks an element up by id.
//! - `/HTML/BODY/DIV` walks direct children from the root element, one tag name per segment.
//!   The first segment stands for the root element itself.
//!   An empty segment (`//`) makes the next named segment match the first descendant in document order
//!   instead of only direct children.
//!
//! Resolution is strictly left-to-right, without backtracking.

use crate::error::SelectorError;
use core::fmt;
use tracing::{instrument, trace, warn};

/// One named step of a path selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
	/// Upper-cased tag name.
	pub name: String,
	/// Whether to search all descendants rather than only direct children.
	pub descend: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
	Id(String),
	Path {
		/// The first segment as written, naming the root element. Empty for `//…` selectors.
		root: String,
		segments: Vec<Segment>,
		/// Whether the selector ended with `/`, which has no effect on resolution.
		trailing_wildcard: bool,
	},
}

impl Selector {
	/// # Errors
	///
	/// [`SelectorError::UnknownSyntax`] iff `selector` starts with neither `#` nor `/`.
	pub fn parse(selector: &str) -> Result<Self, SelectorError> {
		if let Some(id) = selector.strip_prefix('#') {
			return Ok(Selector::Id(id.to_owned()));
		}

		let path = match selector.strip_prefix('/') {
			Some(path) => path,
			None => {
				return Err(SelectorError::UnknownSyntax {
					selector: selector.to_owned(),
				})
			}
		};

		let mut parts = path.split('/');
		let root = parts.next().unwrap_or_default().to_owned();
		let mut descend = root.is_empty();
		let mut segments = Vec::new();
		for part in parts {
			if part.is_empty() {
				descend = true;
			} else {
				segments.push(Segment {
					name: part.to_ascii_uppercase(),
					descend,
				});
				descend = false;
			}
		}

		Ok(Selector::Path {
			root,
			segments,
			trailing_wildcard: descend,
		})
	}

	/// Finds the element this selector addresses in `document`.
	///
	/// Errors quote the selector in its canonical form. Use the free [`resolve`] to have them quote it as written.
	///
	/// # Errors
	///
	/// If no such element exists or the path can't be followed. See [`SelectorError`].
	pub fn resolve(&self, document: &web_sys::Document) -> Result<web_sys::Element, SelectorError> {
		self.resolve_as(document, None)
	}

	/// Like [`Selector::resolve`], but errors quote `written` if given.
	#[instrument(skip(self, document), fields(selector = %self))]
	fn resolve_as(&self, document: &web_sys::Document, written: Option<&str>) -> Result<web_sys::Element, SelectorError> {
		let quoted = || written.map_or_else(|| self.to_string(), ToOwned::to_owned);
		match self {
			Selector::Id(id) => document.get_element_by_id(id).ok_or_else(|| SelectorError::NotFound { id: id.clone() }),
			Selector::Path { root, segments, .. } => {
				let mut current = document.document_element();

				if let Some(root_element) = &current {
					if !root.is_empty() && !root_element.tag_name().eq_ignore_ascii_case(root) {
						warn!("Path root {:?} doesn't match the document element <{}>. Continuing from the document element.", root, root_element.tag_name());
					}
				}

				for (segment_index, segment) in segments.iter().enumerate() {
					let element = current.ok_or_else(|| SelectorError::PathBroken {
						selector: quoted(),
						segment_index,
					})?;

					let found = if segment.descend {
						first_descendant(&element, &segment.name)
					} else {
						first_child(&element, &segment.name)
					};
					trace!(segment = %segment.name, descend = segment.descend, found = found.is_some());

					current = Some(found.ok_or_else(|| SelectorError::SegmentNotFound {
						selector: quoted(),
						segment: segment.name.clone(),
					})?);
				}

				current.ok_or_else(|| SelectorError::PathBroken {
					selector: quoted(),
					segment_index: segments.len(),
				})
			}
		}
	}
}

impl fmt::Display for Selector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Selector::Id(id) => write!(f, "#{}", id),
			Selector::Path {
				root,
				segments,
				trailing_wildcard,
			} => {
				write!(f, "/{}", root)?;
				for (i, segment) in segments.iter().enumerate() {
					// `//X` already carries the descent marker in its empty root.
					if segment.descend && !(i == 0 && root.is_empty()) {
						f.write_str("/")?;
					}
					write!(f, "/{}", segment.name)?;
				}
				if *trailing_wildcard {
					f.write_str("/")?;
				}
				Ok(())
			}
		}
	}
}

/// Parses and resolves `selector` in one step. Errors quote `selector` exactly as given.
///
/// # Errors
///
/// See [`Selector::parse`] and [`Selector::resolve`].
pub fn resolve(selector: &str, document: &web_sys::Document) -> Result<web_sys::Element, SelectorError> {
	Selector::parse(selector)?.resolve_as(document, Some(selector))
}

fn first_child(parent: &web_sys::Element, name: &str) -> Option<web_sys::Element> {
	let children = parent.children();
	(0..children.length()).filter_map(|i| children.item(i)).find(|child| child.tag_name().eq_ignore_ascii_case(name))
}

fn first_descendant(ancestor: &web_sys::Element, name: &str) -> Option<web_sys::Element> {
	// `getElementsByTagName(name)` only folds case for HTML elements, so match manually.
	let all = ancestor.get_elements_by_tag_name("*");
	(0..all.length()).filter_map(|i| all.item(i)).find(|element| element.tag_name().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn segment(name: &str, descend: bool) -> Segment {
		Segment { name: name.to_owned(), descend }
	}

	#[test]
	fn id() {
		assert_eq!(Selector::parse("#main").unwrap(), Selector::Id("main".to_owned()));
		assert_eq!(Selector::parse("#").unwrap(), Selector::Id(String::new()));
	}

	#[test]
	fn absolute_path() {
		assert_eq!(
			Selector::parse("/html/Body/div").unwrap(),
			Selector::Path {
				root: "html".to_owned(),
				segments: vec![segment("BODY", false), segment("DIV", false)],
				trailing_wildcard: false,
			}
		);
	}

	#[test]
	fn leading_wildcard() {
		assert_eq!(
			Selector::parse("//span").unwrap(),
			Selector::Path {
				root: String::new(),
				segments: vec![segment("SPAN", true)],
				trailing_wildcard: false,
			}
		);
	}

	#[test]
	fn inner_and_repeated_wildcards() {
		assert_eq!(
			Selector::parse("/HTML/BODY//UL///LI/A/").unwrap(),
			Selector::Path {
				root: "HTML".to_owned(),
				segments: vec![segment("BODY", false), segment("UL", true), segment("LI", true), segment("A", false)],
				trailing_wildcard: true,
			}
		);
	}

	#[test]
	fn root_only() {
		assert_eq!(
			Selector::parse("/HTML").unwrap(),
			Selector::Path {
				root: "HTML".to_owned(),
				segments: vec![],
				trailing_wildcard: false,
			}
		);
	}

	#[test]
	fn unknown_syntax() {
		for selector in &["", "div", ".class", " #a"] {
			assert_eq!(
				Selector::parse(selector),
				Err(SelectorError::UnknownSyntax {
					selector: (*selector).to_owned()
				})
			);
		}
	}

	#[test]
	fn display_is_canonical() {
		for selector in &["#a", "/HTML/BODY/DIV", "//SPAN", "/HTML/BODY//UL//LI/A/"] {
			assert_eq!(Selector::parse(selector).unwrap().to_string(), *selector);
		}
		assert_eq!(Selector::parse("/html/body").unwrap().to_string(), "/html/BODY");
	}
}
