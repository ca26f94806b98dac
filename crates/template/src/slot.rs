use serde_json::Value;

/// A dynamic value interpolated into a template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Slot {
    /// Serializes to nothing.
    #[default]
    Null,
    /// Inserted verbatim, markup included.
    Raw(String),
    /// Inserted with `& < > " '` escaped.
    Escaped(String),
    /// Each element serialized in order, nothing in between.
    List(Vec<Slot>),
}

impl Slot {
    pub fn escaped(text: impl Into<String>) -> Self {
        Self::Escaped(text.into())
    }

    /// Flattens a sequence of rendered items, the usual way to repeat content.
    pub fn list<T: Into<Self>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn write_to(&self, out: &mut String) {
        match self {
            Self::Null => {}
            Self::Raw(text) => out.push_str(text),
            Self::Escaped(text) => out.push_str(&escape(text)),
            Self::List(items) => {
                for item in items {
                    item.write_to(out);
                }
            }
        }
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }
}

/// Escapes text for use in element content or a quoted attribute.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

impl From<&str> for Slot {
    fn from(text: &str) -> Self {
        Self::Raw(text.to_owned())
    }
}

impl From<String> for Slot {
    fn from(text: String) -> Self {
        Self::Raw(text)
    }
}

impl From<&String> for Slot {
    fn from(text: &String) -> Self {
        Self::Raw(text.clone())
    }
}

impl From<char> for Slot {
    fn from(ch: char) -> Self {
        Self::Raw(ch.to_string())
    }
}

impl From<bool> for Slot {
    fn from(flag: bool) -> Self {
        Self::Raw(flag.to_string())
    }
}

macro_rules! integer_slots {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Slot {
                fn from(number: $ty) -> Self {
                    Self::Raw(number.to_string())
                }
            }
        )*
    };
}

integer_slots!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Slot {
    fn from(number: f64) -> Self {
        let text = if number.is_infinite() {
            if number.is_sign_positive() {
                "Infinity".to_owned()
            } else {
                "-Infinity".to_owned()
            }
        } else {
            number.to_string()
        };
        Self::Raw(text)
    }
}

impl<T: Into<Self>> From<Option<T>> for Slot {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Slot {
    fn from(items: Vec<T>) -> Self {
        Self::list(items)
    }
}

impl From<&Value> for Slot {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::String(text) => Self::Raw(text.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            Value::Number(number) if number.is_f64() => {
                number.as_f64().map_or(Self::Null, Self::from)
            }
            Value::Bool(_) | Value::Number(_) | Value::Object(_) => Self::Raw(value.to_string()),
        }
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Self::from(&value)
    }
}
