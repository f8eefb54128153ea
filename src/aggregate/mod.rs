//! Response aggregators, one per wire format
//!
//! Each aggregator implements the same contract: take the raw payloads one
//! fan-out collected from the nodes of a container, extract the repeated
//! elements, concatenate them in payload order, optionally sort and page,
//! and rebuild a single document under the canonical envelope. The merged
//! response is structurally indistinguishable from what one node would have
//! produced.
//!
//! Every call is a single-pass, synchronous transformation. Nothing is
//! retained between calls, so concurrent requests need no coordination.

pub mod json;
pub mod xml;

use tracing::debug;

use crate::element::Element;
use crate::envelope::ResolvedShape;
use crate::sort::{page_elements, sort_elements};
use crate::types::{AggregateError, Result, WireFormat};

pub use json::JsonAggregator;
pub use xml::XmlAggregator;

/// 0-based page window; a page index is meaningless without a size, so the
/// two only travel together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub index: usize,
    pub size: usize,
}

/// Sort/page parameters of one aggregation call
#[derive(Debug, Clone)]
pub struct AggregationRequest {
    pub sort_field: Option<String>,
    pub ascending: bool,
    pub page: Option<PageRequest>,
}

impl Default for AggregationRequest {
    fn default() -> Self {
        Self {
            sort_field: None,
            ascending: true,
            page: None,
        }
    }
}

impl AggregationRequest {
    /// Plain concatenation: no sorting, no paging
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sorted_by(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.sort_field = Some(field.into());
        self.ascending = ascending;
        self
    }

    pub fn paged(mut self, index: usize, size: usize) -> Self {
        self.page = Some(PageRequest { index, size });
        self
    }
}

/// One wire-format implementation of the merge contract
pub trait FormatAggregator: Send + Sync {
    fn format(&self) -> WireFormat;

    /// Merge the payloads of one logical request into a single document.
    ///
    /// At least one payload is required; the fan-out collaborator answers
    /// 404 upstream when no node responded at all.
    fn aggregate(&self, payloads: &[String], request: &AggregationRequest) -> Result<String>;
}

/// Apply the format-agnostic tail of the pipeline: sort, then page.
///
/// Generic lists carry unnamed raw values, so a sort field is a no-op
/// pass-through for them; windowing still applies.
pub(crate) fn apply_sort_and_page(
    mut elements: Vec<Element>,
    request: &AggregationRequest,
    resolved: &ResolvedShape,
) -> Vec<Element> {
    if let Some(field) = request.sort_field.as_deref() {
        if resolved.is_generic() {
            debug!(shape = %resolved.shape, field, "ignoring sort field for generic list");
        } else {
            sort_elements(&mut elements, field, request.ascending);
        }
    }
    if let Some(page) = request.page {
        elements = page_elements(elements, page.index, page.size);
    }
    elements
}

/// Select the aggregator for a wire format.
///
/// The table is static: aggregators hold no state beyond the envelope
/// naming convention they speak.
pub fn aggregator_for(format: WireFormat) -> &'static dyn FormatAggregator {
    static JSON: JsonAggregator = JsonAggregator;
    static JAXB: XmlAggregator = XmlAggregator::new(WireFormat::JaxbXml);
    static XSTREAM: XmlAggregator = XmlAggregator::new(WireFormat::XstreamXml);
    match format {
        WireFormat::Json => &JSON,
        WireFormat::JaxbXml => &JAXB,
        WireFormat::XstreamXml => &XSTREAM,
    }
}

/// Merge payloads known to be in `format`.
pub fn aggregate(
    format: WireFormat,
    payloads: &[String],
    request: &AggregationRequest,
) -> Result<String> {
    debug!(%format, payloads = payloads.len(), "aggregating fan-out responses");
    aggregator_for(format).aggregate(payloads, request)
}

/// Merge payloads whose format arrives as a declared token.
///
/// Pure dispatch: unknown tokens fail with `UnsupportedFormat`; nothing
/// here knows about containers, hosts or transport.
pub fn dispatch(payloads: &[String], declared: &str, request: &AggregationRequest) -> Result<String> {
    let format = WireFormat::from_token(declared)
        .ok_or_else(|| AggregateError::UnsupportedFormat(declared.to_string()))?;
    aggregate(format, payloads, request)
}
