//! Opaque merged elements and field lookup
//!
//! Aggregation never interprets element content; the only inspection the
//! engine performs is locating a sort key. The same logical field travels
//! under different spellings depending on format and entity (`process-id`,
//! `processInstanceId`, a bare `id` under the qualified-tag convention), so
//! lookup normalizes names and falls back to suffix matching for the legacy
//! aliases.

use serde_json::Value;

use crate::xml::XmlElement;

/// One repeated child of a list envelope, detached from its payload
#[derive(Debug, Clone)]
pub enum Element {
    Json(Value),
    Xml(XmlElement),
}

/// Collapse case and separator style: `process-id`, `process_id` and
/// `ProcessId` all normalize to `processid`.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl Element {
    /// Look up a field value by normalized name.
    ///
    /// Candidates are the element's children/keys in document order, then
    /// its XML attributes. An exact normalized match wins; otherwise a
    /// suffix match in either direction covers aliases like `ProcessId`
    /// against a child named `id`, or `id` against a key `process-id`.
    pub fn field(&self, name: &str) -> Option<String> {
        let target = normalize_name(name);
        if target.is_empty() {
            return None;
        }

        let candidates = self.candidates();
        if let Some((_, value)) = candidates
            .iter()
            .find(|(candidate, _)| *candidate == target)
        {
            return Some(value.clone());
        }
        candidates
            .into_iter()
            .find(|(candidate, _)| candidate.ends_with(&target) || target.ends_with(candidate))
            .map(|(_, value)| value)
    }

    /// Sort key for this element; unresolvable fields degrade to an empty
    /// key instead of failing (observed legacy behavior of the fleet).
    pub fn sort_key(&self, field: &str) -> String {
        self.field(field).unwrap_or_default()
    }

    fn candidates(&self) -> Vec<(String, String)> {
        match self {
            Self::Json(value) => json_candidates(value),
            Self::Xml(element) => xml_candidates(element),
        }
    }
}

fn json_candidates(value: &Value) -> Vec<(String, String)> {
    let Some(object) = value.as_object() else {
        return Vec::new();
    };
    object
        .iter()
        .filter_map(|(key, value)| scalar_to_string(value).map(|v| (normalize_name(key), v)))
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn xml_candidates(element: &XmlElement) -> Vec<(String, String)> {
    let mut candidates: Vec<(String, String)> = element
        .child_elements()
        .map(|child| (normalize_name(&child.name), child.text()))
        .collect();
    candidates.extend(
        element
            .attributes
            .iter()
            .map(|(key, value)| (normalize_name(key), value.clone())),
    );
    candidates
}
