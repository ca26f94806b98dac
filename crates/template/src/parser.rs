//! Markup to desired-tree conversion.
//!
//! html5ever does the parsing so implicit tag closing, whitespace text and entity decoding
//! follow the standard rules. The markup is parsed after an explicit `<body>` start tag,
//! which makes the tree builder treat it the way fragment parsing in a body context does:
//! `<style>` and similar stay where they were written instead of moving to `<head>`, and
//! leading whitespace survives as a text node.

use anyhow::Result;
use dom::DesiredNode;
use html5ever::tendril::TendrilSink as _;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{Attribute, ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

const BODY_PRELUDE: &str = "<!DOCTYPE html><html><head></head><body>";

fn attribute_name(attr: &Attribute) -> String {
    match &attr.name.prefix {
        Some(prefix) => format!("{prefix}:{}", attr.name.local),
        None => attr.name.local.to_string(),
    }
}

fn convert_children(handle: &Handle) -> Vec<DesiredNode> {
    handle.children.borrow().iter().filter_map(convert).collect()
}

fn convert(handle: &Handle) -> Option<DesiredNode> {
    match &handle.data {
        NodeData::Element {
            name,
            attrs,
            template_contents,
            ..
        } => {
            let attributes = attrs
                .borrow()
                .iter()
                .map(|attr| (attribute_name(attr), attr.value.to_string()))
                .collect();
            // `<template>` children live in a separate content fragment
            let children = match template_contents.borrow().as_ref() {
                Some(contents) => convert_children(contents),
                None => convert_children(handle),
            };
            Some(DesiredNode::Element {
                tag: name.local.to_string(),
                attributes,
                children,
            })
        }
        NodeData::Text { contents } => Some(DesiredNode::text(contents.borrow().to_string())),
        NodeData::Comment { contents } => Some(DesiredNode::comment(contents.to_string())),
        _ => None,
    }
}

fn is_element(handle: &Handle, tag: &str) -> bool {
    matches!(&handle.data, NodeData::Element { name, .. } if &*name.local == tag)
}

fn find_body(document: &Handle) -> Option<Handle> {
    let children = document.children.borrow();
    let html = children.iter().find(|child| is_element(child, "html"))?;
    let html_children = html.children.borrow();
    html_children
        .iter()
        .find(|child| is_element(child, "body"))
        .cloned()
}

/// Parses markup in body context and returns its top-level nodes.
///
/// # Errors
/// Returns an error if the parser fails to read the input.
pub fn parse_fragment(markup: &str) -> Result<Vec<DesiredNode>> {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            exact_errors: false,
            scripting_enabled: false,
            ..TreeBuilderOpts::default()
        },
        ..ParseOpts::default()
    };

    let mut source = String::with_capacity(BODY_PRELUDE.len() + markup.len());
    source.push_str(BODY_PRELUDE);
    source.push_str(markup);

    let parsed = parse_document(RcDom::default(), opts)
        .from_utf8()
        .read_from(&mut source.as_bytes())?;

    let Some(body) = find_body(&parsed.document) else {
        log::warn!("parsed markup has no body, rendering nothing");
        return Ok(Vec::new());
    };
    Ok(convert_children(&body))
}
