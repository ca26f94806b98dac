//! Detached trees describing what a render pass wants on screen.

/// A node of a desired tree. Produced fresh by every render pass and dropped once merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesiredNode {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        children: Vec<DesiredNode>,
    },
    Text {
        content: String,
    },
    Comment {
        content: String,
    },
}

impl DesiredNode {
    /// Element with no attributes and no children.
    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Self::Comment {
            content: content.into(),
        }
    }

    /// Adds an attribute, builder style. No-op on non-elements.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Element { attributes, .. } = &mut self {
            attributes.push((name.into(), value.into()));
        }
        self
    }

    /// Appends a child, builder style. No-op on non-elements.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Element { tag, .. } => Some(tag),
            Self::Text { .. } | Self::Comment { .. } => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Self::Element { attributes, .. } => attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            Self::Text { .. } | Self::Comment { .. } => None,
        }
    }

    pub fn children(&self) -> &[Self] {
        match self {
            Self::Element { children, .. } => children,
            Self::Text { .. } | Self::Comment { .. } => &[],
        }
    }
}

/// Root of a desired tree: zero or more top-level nodes, like a document fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub children: Vec<DesiredNode>,
}

impl Fragment {
    pub const fn new(children: Vec<DesiredNode>) -> Self {
        Self { children }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl From<Vec<DesiredNode>> for Fragment {
    fn from(children: Vec<DesiredNode>) -> Self {
        Self::new(children)
    }
}
