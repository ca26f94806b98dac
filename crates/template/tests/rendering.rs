//! Template rendering follows standard HTML parsing rules.

use template::{DesiredNode, Slot, Template, render};

#[test]
fn implicit_end_tags_are_closed() {
    let fragment = render(&["<p>one<p>two"], &[]).unwrap_or_default();

    assert_eq!(
        fragment.children,
        vec![
            DesiredNode::element("p").with_child(DesiredNode::text("one")),
            DesiredNode::element("p").with_child(DesiredNode::text("two")),
        ]
    );
}

#[test]
fn entities_are_decoded_in_text_and_attributes() {
    let fragment = render(&["<a title=\"x &amp; y\">1 &lt; 2</a>"], &[]).unwrap_or_default();

    let anchor = &fragment.children[0];
    assert_eq!(anchor.attr("title"), Some("x & y"));
    assert_eq!(anchor.children(), &[DesiredNode::text("1 < 2")]);
}

#[test]
fn rendered_item_lists_become_siblings() {
    let items: Vec<String> = ["milk", "eggs"]
        .iter()
        .map(|item| format!("<li>{item}</li>"))
        .collect();

    let fragment = render(&["<ul>", "</ul>"], &[Slot::from(items)]).unwrap_or_default();

    let list = &fragment.children[0];
    assert_eq!(list.tag(), Some("ul"));
    assert_eq!(list.children().len(), 2);
    assert_eq!(list.children()[1].children(), &[DesiredNode::text("eggs")]);
}

#[test]
fn missing_values_render_empty() {
    let fragment = Template::new()
        .raw("<span>")
        .slot(None::<&str>)
        .raw("</span>")
        .render()
        .unwrap_or_default();

    assert_eq!(fragment.children, vec![DesiredNode::element("span")]);
}

#[test]
fn raw_interpolation_is_parsed_as_markup() {
    let fragment = render(&["<div>", "</div>"], &[Slot::from("<b>bold</b>")]).unwrap_or_default();

    assert_eq!(fragment.children[0].children()[0].tag(), Some("b"));
}

#[test]
fn escaped_interpolation_stays_text() {
    let fragment =
        render(&["<div>", "</div>"], &[Slot::escaped("<b>bold</b>")]).unwrap_or_default();

    assert_eq!(
        fragment.children[0].children(),
        &[DesiredNode::text("<b>bold</b>")]
    );
}

#[test]
fn binding_attribute_survives_parsing_verbatim() {
    let fragment = render(
        &["<button data-events='{\"click\": \"", "\"}'>go</button>"],
        &[Slot::from("timer:start")],
    )
    .unwrap_or_default();

    assert_eq!(
        fragment.children[0].attr("data-events"),
        Some("{\"click\": \"timer:start\"}")
    );
}
