use core::fmt;

use indextree::NodeId;
use serde_json::{Map, Value, json};

use crate::tree::{DOMNode, Dom, NodeKind};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

// -----------------------
// Module-scope helpers
// -----------------------

fn flush_text(children: &mut Vec<Value>, text_buf: &mut String) {
    if !text_buf.trim().is_empty() {
        children.push(json!({ "type": "text", "text": text_buf.clone() }));
    }
    text_buf.clear();
}

fn coalesce_children(dom: &Dom, id: NodeId) -> Vec<Value> {
    let mut children = Vec::new();
    let mut text_buf = String::new();
    for child in dom.children(id) {
        if let Some(NodeKind::Text { text }) = dom.kind(child) {
            text_buf.push_str(text);
            continue;
        }
        flush_text(&mut children, &mut text_buf);
        let value = node_to_json(dom, child);
        if !value.is_null() {
            children.push(value);
        }
    }
    flush_text(&mut children, &mut text_buf);
    children
}

fn node_to_json(dom: &Dom, id: NodeId) -> Value {
    let Some(DOMNode { kind, attrs, .. }) = dom.node(id) else {
        return Value::Null;
    };
    match kind {
        NodeKind::Document => json!({ "type": "document", "children": coalesce_children(dom, id) }),
        NodeKind::Element { tag } => {
            let mut pairs: Vec<&(String, String)> = attrs.iter().collect();
            pairs.sort_by(|left, right| left.0.cmp(&right.0));
            let mut attrs_obj = Map::new();
            for (key, value) in pairs {
                attrs_obj.insert(key.clone(), Value::String(value.clone()));
            }
            json!({
                "type": "element",
                "tag": tag,
                "attrs": Value::Object(attrs_obj),
                "children": coalesce_children(dom, id),
            })
        }
        NodeKind::Text { text } => {
            if text.trim().is_empty() {
                Value::Null
            } else {
                json!({ "type": "text", "text": text })
            }
        }
        // Comments never reach snapshots
        NodeKind::Comment { .. } => Value::Null,
    }
}

fn escape_markup(text: &str, out: &mut String, in_attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !in_attribute => out.push_str("&lt;"),
            '>' if !in_attribute => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn write_html(dom: &Dom, id: NodeId, out: &mut String) {
    let Some(node) = dom.node(id) else {
        return;
    };
    match &node.kind {
        NodeKind::Document => {
            for child in dom.children(id) {
                write_html(dom, child, out);
            }
        }
        NodeKind::Element { tag } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in &node.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_markup(value, out, true);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            for child in dom.children(id) {
                write_html(dom, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        NodeKind::Text { text } => escape_markup(text, out, false),
        NodeKind::Comment { text } => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

impl fmt::Debug for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            for _ in 0..depth {
                f.write_str("  ")?;
            }
            Ok(())
        }

        fn escape_text(text: &str) -> String {
            let mut out = String::with_capacity(text.len());
            for ch in text.chars() {
                match ch {
                    '\\' => out.push_str("\\\\"),
                    '"' => out.push_str("\\\""),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    _ => out.push(ch),
                }
            }
            out
        }

        fn fmt_node(dom: &Dom, id: NodeId, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            let Some(node) = dom.node(id) else {
                return Ok(());
            };
            match &node.kind {
                NodeKind::Document => {
                    write_indent(f, depth)?;
                    writeln!(f, "#document")?;
                }
                NodeKind::Element { tag } => {
                    write_indent(f, depth)?;
                    write!(f, "<{tag}")?;
                    let mut pairs: Vec<&(String, String)> = node.attrs.iter().collect();
                    pairs.sort_by(|left, right| left.0.cmp(&right.0));
                    for (key, value) in pairs {
                        write!(f, " {key}=\"{}\"", escape_text(value))?;
                    }
                    if let Some(value) = &node.value {
                        write!(f, " .value=\"{}\"", escape_text(value))?;
                    }
                    writeln!(f, ">")?;
                }
                NodeKind::Text { text } => {
                    // Pure-whitespace text nodes only add noise
                    if text.chars().all(char::is_whitespace) {
                        return Ok(());
                    }
                    write_indent(f, depth)?;
                    writeln!(f, "\"{}\"", escape_text(text))?;
                }
                NodeKind::Comment { text } => {
                    write_indent(f, depth)?;
                    writeln!(f, "<!--{}-->", escape_text(text))?;
                }
            }
            for child in dom.children(id) {
                fmt_node(dom, child, f, depth + 1)?;
            }
            Ok(())
        }

        fmt_node(self, self.root, f, 0)
    }
}

impl Dom {
    /// Deterministic JSON snapshot of the subtree at `id`.
    ///
    /// Schema:
    /// - Document: `{ "type":"document", "children":[ ... ] }`
    /// - Element: `{ "type":"element", "tag":"div", "attrs":{..}, "children":[ ... ] }`
    /// - Text: `{ "type":"text", "text":"..." }`
    ///
    /// Adjacent text nodes are merged; whitespace-only text and comments are dropped.
    pub fn to_json(&self, id: NodeId) -> Value {
        node_to_json(self, id)
    }

    /// Serializes the subtree at `id` back to markup, `id` included.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        write_html(self, id, &mut out);
        out
    }

    /// Serializes only the children of `id`, like `innerHTML`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            write_html(self, child, &mut out);
        }
        out
    }
}
