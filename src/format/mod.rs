//! JSON → HTML table formatter.
//!
//! The decoded response is classified once into a [`Shape`] and rendered as
//! a single `<table>`:
//!
//! | Shape    | Rendering                                                  |
//! |----------|------------------------------------------------------------|
//! | Sequence | header from the first element's keys, one row per element  |
//! | Mapping  | one `<th>key</th><td>value</td>` row per key               |
//! | Scalar   | one row, one cell                                          |
//!
//! Keys and values are inserted verbatim. Nothing is HTML-escaped, so markup
//! in a response body ends up in the page.

use serde_json::{Map, Value};

const TABLE_OPEN: &str = r#"<table border="1" style="width: 100%; border-collapse: collapse;">"#;
const TABLE_CLOSE: &str = "</table>";

/// Closed classification of a decoded response value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape<'a> {
    Sequence(&'a [Value]),
    Mapping(&'a Map<String, Value>),
    Scalar(&'a Value),
}

impl<'a> Shape<'a> {
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => Self::Sequence(items),
            Value::Object(map) => Self::Mapping(map),
            other => Self::Scalar(other),
        }
    }
}

/// Render a decoded response as an HTML table.
pub fn format(value: &Value) -> String {
    let mut html = String::from(TABLE_OPEN);

    match Shape::of(value) {
        Shape::Sequence(items) => render_sequence(&mut html, items),
        Shape::Mapping(map) => render_mapping(&mut html, map),
        Shape::Scalar(scalar) => {
            html.push_str("<tr><td>");
            html.push_str(&cell_text(scalar));
            html.push_str("</td></tr>");
        }
    }

    html.push_str(TABLE_CLOSE);
    html
}

/// Render the error text shown in place of a table.
pub fn format_error(message: &str) -> String {
    format!("Error: {message}")
}

fn render_sequence(html: &mut String, items: &[Value]) {
    let header = items.first().map(header_keys).unwrap_or_default();

    html.push_str("<tr>");
    for key in &header {
        html.push_str("<th>");
        html.push_str(key);
        html.push_str("</th>");
    }
    html.push_str("</tr>");

    for item in items {
        html.push_str("<tr>");
        for key in &header {
            html.push_str("<td>");
            if let Some(cell) = lookup(item, key) {
                html.push_str(&cell_text(cell));
            }
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
}

fn render_mapping(html: &mut String, map: &Map<String, Value>) {
    for (key, value) in map {
        html.push_str("<tr><th>");
        html.push_str(key);
        html.push_str("</th><td>");
        html.push_str(&cell_text(value));
        html.push_str("</td></tr>");
    }
}

/// Column keys contributed by the first element of a sequence.
///
/// Objects give their keys in document order, arrays give their indices,
/// and scalars give nothing.
fn header_keys(first: &Value) -> Vec<String> {
    match first {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}

fn lookup<'a>(item: &'a Value, key: &str) -> Option<&'a Value> {
    match item {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// String form of a single cell. Strings are unquoted; everything else uses
/// its compact JSON form.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
