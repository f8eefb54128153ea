//! JSON convention aggregator
//!
//! Nodes answer JSON list queries as an object holding the repeated
//! elements under a shape-specific key (sometimes below a nesting path,
//! e.g. a `result` wrapper around container lists), or as a bare array for
//! untyped raw-value queries. Merging splices the element arrays together
//! and rebuilds the document on top of the first shape-resolving payload,
//! so envelope siblings like a response `type`/`msg` survive.

use serde_json::{Map, Value};
use tracing::debug;

use crate::aggregate::{apply_sort_and_page, AggregationRequest, FormatAggregator};
use crate::element::Element;
use crate::envelope::{self, EnvelopeNames, ResolvedShape, ShapeVerdict, SHAPES};
use crate::types::{AggregateError, Result, WireFormat};

pub struct JsonAggregator;

impl JsonAggregator {
    fn parse(index: usize, payload: &str) -> Result<Value> {
        serde_json::from_str(payload).map_err(|e| AggregateError::MalformedPayload {
            index,
            reason: e.to_string(),
        })
    }

    fn sniff(doc: &Value) -> ShapeVerdict {
        if doc.is_array() {
            return ShapeVerdict::Generic;
        }
        if doc.is_object() {
            for spec in SHAPES {
                if Self::matches(doc, &spec.json) {
                    return ShapeVerdict::Shape(spec);
                }
            }
        }
        ShapeVerdict::None
    }

    /// A document matches a shape when its nesting path is fully present
    /// (flat shapes: when the element key itself is present). An empty
    /// envelope still matches; a bare `{}` matches nothing.
    fn matches(doc: &Value, names: &EnvelopeNames) -> bool {
        let mut cursor = doc;
        for segment in names.path {
            match cursor.get(segment) {
                Some(next) => cursor = next,
                None => return false,
            }
        }
        if names.path.is_empty() {
            cursor.get(names.element).is_some()
        } else {
            true
        }
    }

    /// Ordered elements of one payload under the resolved shape.
    ///
    /// Absent key, `null` and an empty array all mean zero elements; a
    /// single object where an array is expected counts as one element
    /// (legacy serializer quirk of the fleet).
    pub fn extract_elements(doc: &Value, resolved: &ResolvedShape) -> Vec<Element> {
        let Some(spec) = resolved.spec else {
            return match doc {
                Value::Array(items) => items.iter().cloned().map(Element::Json).collect(),
                _ => Vec::new(),
            };
        };

        let names = &spec.json;
        let mut cursor = doc;
        for segment in names.path {
            match cursor.get(segment) {
                Some(next) => cursor = next,
                None => return Vec::new(),
            }
        }
        match cursor.get(names.element) {
            Some(Value::Array(items)) => items.iter().cloned().map(Element::Json).collect(),
            Some(Value::Object(single)) => vec![Element::Json(Value::Object(single.clone()))],
            _ => Vec::new(),
        }
    }

    /// Rebuild one document under the resolved envelope, reusing the
    /// template payload so fields next to the collection are kept.
    pub fn rebuild(
        template: &Value,
        resolved: &ResolvedShape,
        elements: Vec<Element>,
    ) -> Result<String> {
        let values: Vec<Value> = elements
            .into_iter()
            .filter_map(|element| match element {
                Element::Json(value) => Some(value),
                Element::Xml(_) => None,
            })
            .collect();

        let Some(spec) = resolved.spec else {
            return serde_json::to_string(&Value::Array(values)).map_err(|e| {
                AggregateError::MalformedPayload {
                    index: resolved.template,
                    reason: e.to_string(),
                }
            });
        };

        let names = &spec.json;
        let mut doc = template.clone();
        let mut cursor = &mut doc;
        for segment in names.path {
            cursor = ensure_object(cursor)
                .entry(segment.to_string())
                .or_insert(Value::Null);
        }
        ensure_object(cursor).insert(names.element.to_string(), Value::Array(values));

        serde_json::to_string(&doc).map_err(|e| AggregateError::MalformedPayload {
            index: resolved.template,
            reason: e.to_string(),
        })
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just made an object"),
    }
}

impl FormatAggregator for JsonAggregator {
    fn format(&self) -> WireFormat {
        WireFormat::Json
    }

    fn aggregate(&self, payloads: &[String], request: &AggregationRequest) -> Result<String> {
        if payloads.is_empty() {
            return Err(AggregateError::MalformedPayload {
                index: 0,
                reason: "empty payload batch".to_string(),
            });
        }
        let docs = payloads
            .iter()
            .enumerate()
            .map(|(index, payload)| Self::parse(index, payload))
            .collect::<Result<Vec<_>>>()?;

        let verdicts: Vec<ShapeVerdict> = docs.iter().map(Self::sniff).collect();
        let resolved = envelope::resolve(&verdicts)?;

        let mut elements = Vec::new();
        for doc in &docs {
            elements.extend(Self::extract_elements(doc, &resolved));
        }
        debug!(shape = %resolved.shape, total = elements.len(), "merged JSON elements");

        let elements = apply_sort_and_page(elements, request, &resolved);
        Self::rebuild(&docs[resolved.template], &resolved, elements)
    }
}
