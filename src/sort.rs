//! Format-agnostic sorting and paging of merged elements
//!
//! Works purely on [`Element`] sort keys, so every wire format shares the
//! same ordering and windowing behavior. Sorting is stable: equal keys keep
//! the payload-concatenation order.

use std::cmp::Ordering;

use crate::element::Element;

/// Compare two sort keys: numerically when both parse as numbers, as plain
/// strings otherwise.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    if let (Ok(left), Ok(right)) = (a.parse::<f64>(), b.parse::<f64>()) {
        if let Some(ordering) = left.partial_cmp(&right) {
            return ordering;
        }
    }
    a.cmp(b)
}

/// Stable sort by a named field. Elements where the field cannot be
/// resolved sort with an empty key rather than failing.
pub fn sort_elements(elements: &mut Vec<Element>, field: &str, ascending: bool) {
    let mut keyed: Vec<(String, Element)> = elements
        .drain(..)
        .map(|element| (element.sort_key(field), element))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| {
        let ordering = compare_keys(a, b);
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
    elements.extend(keyed.into_iter().map(|(_, element)| element));
}

/// Return the requested window of `elements`.
///
/// A window that starts at or past the end yields an empty list; a window
/// that overruns the end is truncated.
pub fn page_elements(elements: Vec<Element>, index: usize, size: usize) -> Vec<Element> {
    let start = index.saturating_mul(size);
    if start >= elements.len() {
        return Vec::new();
    }
    elements.into_iter().skip(start).take(size).collect()
}
