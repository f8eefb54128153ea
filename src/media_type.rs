//! Media-type helpers for the fan-out path
//!
//! The gateway decides how to treat a batch of node responses from plain
//! header strings: which aggregator to use, whether the responses may be
//! merged at all, and how wide a page window each node must be asked for so
//! the merged set can be re-paged. All pure string/arithmetic functions; no
//! transport types leak in here.

use std::collections::HashMap;

use crate::types::WireFormat;

/// Media-type parameters after the first `;`, e.g.
/// `application/json;aggregatable=false` → `{aggregatable: false}`.
pub fn parameters(media_type: &str) -> HashMap<String, String> {
    media_type
        .split(';')
        .skip(1)
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            Some((
                key.trim().to_ascii_lowercase(),
                value.trim().trim_matches('"').to_string(),
            ))
        })
        .collect()
}

/// Whether responses with this content type may be merged.
///
/// Backends opt out of merging with an `aggregatable=false` media-type
/// parameter; an unknown or absent content type is treated as mergeable.
pub fn is_aggregatable(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    match parameters(content_type).get("aggregatable") {
        Some(value) => value.eq_ignore_ascii_case("true"),
        None => true,
    }
}

/// Pick the wire format from the fleet's content negotiation headers.
///
/// An explicit format token (the `X-KIE-ContentType` header) wins; otherwise
/// the `Accept` media type decides between JSON and plain XML. The
/// qualified-tag XML convention is only ever selected explicitly. With
/// neither header the fleet defaults to plain XML.
pub fn select_format(format_token: Option<&str>, accept: Option<&str>) -> Option<WireFormat> {
    if let Some(token) = format_token {
        return WireFormat::from_token(token);
    }
    match accept {
        Some(accept) => {
            let accept = accept.to_ascii_lowercase();
            if accept.contains("application/json") {
                Some(WireFormat::Json)
            } else if accept.contains("xml") {
                Some(WireFormat::JaxbXml)
            } else {
                None
            }
        }
        None => Some(WireFormat::JaxbXml),
    }
}

/// Page window to request from every node so that page `page` of size
/// `page_size` can be cut from the merged result: always page 0, widened to
/// cover everything up to and including the requested page.
pub fn fetch_window(page: usize, page_size: usize) -> (usize, usize) {
    (0, page.saturating_add(1).saturating_mul(page_size))
}
