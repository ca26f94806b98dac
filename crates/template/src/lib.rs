//! Template engine: interleaves static markup with interpolated values and parses the
//! result into a detached [`Fragment`].
//!
//! Interpolated values are inserted verbatim. Markup coming from users therefore reaches
//! the tree unescaped, which is an XSS exposure this crate does not close on its own; wrap
//! such values with [`Slot::escaped`] (or run them through [`escape`]) to opt in.

mod parser;
mod slot;

use anyhow::Result;
pub use dom::{DesiredNode, Fragment};
pub use slot::{Slot, escape};

/// Concatenates static parts and values left to right: part 0, value 0, part 1, ...
///
/// Surplus parts or values are appended in order.
pub fn markup<S: AsRef<str>>(parts: &[S], values: &[Slot]) -> String {
    let mut out = String::new();
    for index in 0..parts.len().max(values.len()) {
        if let Some(part) = parts.get(index) {
            out.push_str(part.as_ref());
        }
        if let Some(value) = values.get(index) {
            value.write_to(&mut out);
        }
    }
    out
}

/// Parses complete markup into a fragment.
///
/// # Errors
/// Returns an error if the HTML parser fails to read the input.
pub fn parse(markup: &str) -> Result<Fragment> {
    let children = parser::parse_fragment(markup)?;
    log::trace!(
        "parsed {} bytes of markup into {} top-level nodes",
        markup.len(),
        children.len()
    );
    Ok(Fragment::new(children))
}

/// Renders a template: `render(&["<p>", "</p>"], &[count.into()])`.
///
/// # Errors
/// Returns an error if the HTML parser fails to read the input.
pub fn render<S: AsRef<str>>(parts: &[S], values: &[Slot]) -> Result<Fragment> {
    parse(&markup(parts, values))
}

/// Builder for templates assembled piece by piece.
///
/// ```ignore
/// let fragment = Template::new()
///     .raw("<p>Count: ")
///     .slot(count)
///     .raw("</p>")
///     .render()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Template {
    parts: Vec<String>,
    values: Vec<Slot>,
}

impl Template {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            parts: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Appends static markup.
    #[must_use]
    pub fn raw(mut self, markup: impl AsRef<str>) -> Self {
        if self.parts.len() == self.values.len() {
            self.parts.push(String::new());
        }
        if let Some(last) = self.parts.last_mut() {
            last.push_str(markup.as_ref());
        }
        self
    }

    /// Appends an interpolated value.
    #[must_use]
    pub fn slot(mut self, value: impl Into<Slot>) -> Self {
        if self.parts.len() == self.values.len() {
            self.parts.push(String::new());
        }
        self.values.push(value.into());
        self
    }

    pub fn markup(&self) -> String {
        markup(self.parts.as_slice(), self.values.as_slice())
    }

    /// # Errors
    /// Returns an error if the HTML parser fails to read the input.
    pub fn render(&self) -> Result<Fragment> {
        parse(&self.markup())
    }
}
