use deliverance_dom::{resolve, Selector, SelectorError};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::Node;

wasm_bindgen_test_configure!(run_in_browser);

use web_document_::document;

#[wasm_bindgen_test]
fn id() {
	let document = document(r#"<div><p id="target">x</p></div>"#);
	let element = resolve("#target", &document).unwrap();
	assert_eq!(element.tag_name(), "P");
	assert_eq!(element.id(), "target");
}

#[wasm_bindgen_test]
fn id_not_found() {
	let document = document(r#"<p id="other"></p>"#);
	assert_eq!(resolve("#target", &document), Err(SelectorError::NotFound { id: "target".to_owned() }));
}

#[wasm_bindgen_test]
fn direct_children_only() {
	let document = document(r#"<section><div id="nested"></div></section><div id="first"></div><div id="second"></div>"#);
	assert_eq!(resolve("/HTML/BODY/DIV", &document).unwrap().id(), "first");
}

#[wasm_bindgen_test]
fn case_insensitive_segments() {
	let document = document(r#"<div id="first"></div>"#);
	assert_eq!(resolve("/html/body/div", &document).unwrap().id(), "first");
}

#[wasm_bindgen_test]
fn root_only() {
	let document = document("");
	assert_eq!(resolve("/HTML", &document).unwrap().tag_name(), "HTML");
}

#[wasm_bindgen_test]
fn wildcard_descent() {
	let document = document(r#"<div><ul><li><span id="deep"></span></li></ul></div><span id="shallow"></span>"#);
	assert_eq!(resolve("//SPAN", &document).unwrap().id(), "deep");
	assert_eq!(resolve("/HTML/BODY//SPAN", &document).unwrap().id(), "deep");
	assert_eq!(resolve("/HTML/BODY/SPAN", &document).unwrap().id(), "shallow");
}

#[wasm_bindgen_test]
fn wildcard_resets_after_segment() {
	let document = document(r#"<main><div><p id="deep"></p></div><p id="child"></p></main>"#);
	assert_eq!(resolve("//MAIN/P", &document).unwrap().id(), "child");
	assert_eq!(resolve("//MAIN//P", &document).unwrap().id(), "deep");
}

#[wasm_bindgen_test]
fn no_backtracking() {
	let document = document(r#"<div id="first"></div><div id="second"><span></span></div>"#);
	assert_eq!(
		resolve("/HTML/BODY/DIV/SPAN", &document),
		Err(SelectorError::SegmentNotFound {
			selector: "/HTML/BODY/DIV/SPAN".to_owned(),
			segment: "SPAN".to_owned(),
		})
	);
}

#[wasm_bindgen_test]
fn segment_not_found() {
	let document = document("<div></div>");
	assert_eq!(
		resolve("/HTML/BODY/ASIDE", &document),
		Err(SelectorError::SegmentNotFound {
			selector: "/HTML/BODY/ASIDE".to_owned(),
			segment: "ASIDE".to_owned(),
		})
	);
	assert_eq!(
		resolve("//ASIDE", &document),
		Err(SelectorError::SegmentNotFound {
			selector: "//ASIDE".to_owned(),
			segment: "ASIDE".to_owned(),
		})
	);
}

#[wasm_bindgen_test]
fn errors_quote_the_selector_as_written() {
	let document = document("<ul></ul>");
	let written = "/html/body//UL///LI";
	assert_eq!(
		resolve(written, &document),
		Err(SelectorError::SegmentNotFound {
			selector: written.to_owned(),
			segment: "LI".to_owned(),
		})
	);

	// A parsed selector only knows its canonical form.
	assert_eq!(
		Selector::parse(written).unwrap().resolve(&document),
		Err(SelectorError::SegmentNotFound {
			selector: "/html/BODY//UL//LI".to_owned(),
			segment: "LI".to_owned(),
		})
	);
}

#[wasm_bindgen_test]
fn path_broken_without_root_element() {
	let document = document("");
	let root = document.document_element().unwrap();
	document.remove_child(&root).unwrap();
	assert_eq!(
		resolve("/HTML/BODY", &document),
		Err(SelectorError::PathBroken {
			selector: "/HTML/BODY".to_owned(),
			segment_index: 0,
		})
	);
}

#[wasm_bindgen_test]
fn parsed_selector_is_reusable() {
	let document = document(r#"<div id="first"></div>"#);
	let selector = Selector::parse("/HTML/BODY/DIV").unwrap();
	let a = selector.resolve(&document).unwrap();
	let b = selector.resolve(&document).unwrap();
	let b: &Node = b.as_ref();
	assert!(a.is_same_node(Some(b)));
}

#[wasm_bindgen_test]
fn unknown_syntax() {
	let document = document("<div></div>");
	assert_eq!(resolve("div", &document), Err(SelectorError::UnknownSyntax { selector: "div".to_owned() }));
}
