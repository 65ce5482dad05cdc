//! Structural wrapper views over a loaded image.
//!
//! A [`WrapperNode`] is a snapshot of one structural element (a header, a
//! table, a table row) built from the image bytes on demand. Nodes own their
//! data and never borrow the image, so a mutation of the image can't leave a
//! dangling view behind; callers simply ask for a fresh node afterwards.

use std::fmt;

use crate::core::address::{AddrKind, Offset, INVALID_ADDR};

/// A renderable value held by a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrappedValue {
    /// Little-endian integer of `width` bytes
    Int { value: u64, width: u8 },
    /// Decoded text (section names, DLL names)
    Str(String),
}

impl WrappedValue {
    pub fn int(value: u64, width: u8) -> Self {
        WrappedValue::Int { value, width }
    }

    /// Integer payload, if this is an integer value.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            WrappedValue::Int { value, .. } => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for WrappedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WrappedValue::Int { value, width } => {
                write!(f, "{:0w$X}", value, w = *width as usize * 2)
            }
            WrappedValue::Str(s) => f.write_str(s),
        }
    }
}

/// A value plus the address space it points into, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubValue {
    pub value: WrappedValue,
    pub kind: AddrKind,
}

/// One named field of a wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Raw offset of the field, or `INVALID_ADDR` when not offset-backed
    pub offset: Offset,
    pub translated: Option<String>,
    pub values: Vec<SubValue>,
}

impl Field {
    pub fn new(name: impl Into<String>, offset: Offset) -> Self {
        Self {
            name: name.into(),
            offset,
            translated: None,
            values: Vec::new(),
        }
    }

    /// A field with no backing offset; dumps skip it.
    pub fn detached(name: impl Into<String>) -> Self {
        Self::new(name, INVALID_ADDR)
    }

    pub fn with_value(mut self, value: WrappedValue, kind: AddrKind) -> Self {
        self.values.push(SubValue { value, kind });
        self
    }

    pub fn with_translation(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.translated = if text.is_empty() { None } else { Some(text) };
        self
    }

    /// Translated text, empty when the field has none.
    pub fn translated(&self) -> &str {
        self.translated.as_deref().unwrap_or("")
    }
}

/// A structural element of the image: ordered fields plus ordered child entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperNode {
    pub name: String,
    /// Raw offset of the element's first byte
    pub offset: Offset,
    pub size: u64,
    fields: Vec<Field>,
    entries: Vec<WrapperNode>,
}

impl WrapperNode {
    pub fn new(name: impl Into<String>, offset: Offset, size: u64) -> Self {
        Self {
            name: name.into(),
            offset,
            size,
            fields: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn push_field(&mut self, field: Field) -> &mut Self {
        self.fields.push(field);
        self
    }

    pub fn push_entry(&mut self, entry: WrapperNode) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn fields_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Number of sub-values carried by the field at `index`.
    pub fn sub_fields_count(&self, index: usize) -> usize {
        self.fields.get(index).map_or(0, |f| f.values.len())
    }

    pub fn entries(&self) -> &[WrapperNode] {
        &self.entries
    }

    pub fn entries_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entry_at(&self, index: usize) -> Option<&WrapperNode> {
        self.entries.get(index)
    }

    pub fn is_leaf(&self) -> bool {
        self.entries.is_empty()
    }
}
