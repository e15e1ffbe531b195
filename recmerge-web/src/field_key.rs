//! Form field names for the review page
//!
//! Every control on the review page is addressed by a [`FieldKey`]:
//! `(element, incoming line, master record id, column)`. The encoded name is
//!
//! ```text
//! <element>.<line>.<b64(record id)>.<b64(column)>
//! ```
//!
//! with URL-safe, unpadded base64 for the two free-text components, so names
//! are deterministic, unique per combination and safe inside HTML attributes.
//! An absent component and an empty one encode identically and decode as absent.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::collections::HashMap;
use std::fmt;

/// Kind of control a field name addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    /// Chosen master id for a line
    Match,
    /// MASTER / USER / INCOMING choice for one candidate field
    Select,
    /// Free-text replacement for one candidate field
    UserEntry,
    /// New-address checkbox for a line
    NewAddress,
}

impl Element {
    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Match => "match",
            Element::Select => "select",
            Element::UserEntry => "userentrybox",
            Element::NewAddress => "newaddressbox",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "match" => Some(Element::Match),
            "select" => Some(Element::Select),
            "userentrybox" => Some(Element::UserEntry),
            "newaddressbox" => Some(Element::NewAddress),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub element: Element,
    pub line: usize,
    pub record_id: Option<String>,
    pub column: Option<String>,
}

impl FieldKey {
    pub fn master_choice(line: usize) -> Self {
        Self {
            element: Element::Match,
            line,
            record_id: None,
            column: None,
        }
    }

    pub fn field_choice(line: usize, record_id: &str, column: &str) -> Self {
        Self::for_field(Element::Select, line, record_id, column)
    }

    pub fn user_entry(line: usize, record_id: &str, column: &str) -> Self {
        Self::for_field(Element::UserEntry, line, record_id, column)
    }

    pub fn new_address(line: usize) -> Self {
        Self {
            element: Element::NewAddress,
            line,
            record_id: None,
            column: None,
        }
    }

    fn for_field(element: Element, line: usize, record_id: &str, column: &str) -> Self {
        Self {
            element,
            line,
            record_id: non_empty(record_id),
            column: non_empty(column),
        }
    }

    pub fn encode(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.element.as_str(),
            self.line,
            URL_SAFE_NO_PAD.encode(self.record_id.as_deref().unwrap_or("")),
            URL_SAFE_NO_PAD.encode(self.column.as_deref().unwrap_or("")),
        )
    }

    /// Inverse of [`FieldKey::encode`]; `None` for anything it did not produce
    pub fn decode(name: &str) -> Option<Self> {
        let mut parts = name.split('.');
        let element = Element::parse(parts.next()?)?;
        let line = parts.next()?.parse().ok()?;
        let record_id = decode_component(parts.next()?)?;
        let column = decode_component(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            element,
            line,
            record_id,
            column,
        })
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn decode_component(part: &str) -> Option<Option<String>> {
    let bytes = URL_SAFE_NO_PAD.decode(part).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    Some(non_empty(&text))
}

/// Submitted resolution form, looked up by [`FieldKey`]
#[derive(Debug, Clone, Default)]
pub struct ResolutionForm {
    fields: HashMap<String, String>,
}

impl ResolutionForm {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &FieldKey) -> Option<&str> {
        self.fields.get(&key.encode()).map(String::as_str)
    }

    /// Checkbox semantics: present with any non-empty value
    pub fn is_checked(&self, key: &FieldKey) -> bool {
        self.get(key).map(|v| !v.is_empty()).unwrap_or(false)
    }

    pub fn set(&mut self, key: &FieldKey, value: impl Into<String>) {
        self.fields.insert(key.encode(), value.into());
    }
}
