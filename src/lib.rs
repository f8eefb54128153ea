//! Gathering - response aggregation engine for fan-out gateways
//!
//! "For where two or three are gathered together" - Matthew 18:20
//!
//! A stateless gateway that fronts a fleet of identical execution servers
//! answers list queries by asking every node hosting the container and
//! folding the partial responses into one document. This crate is that
//! folding: per-node payloads are merged under the canonical envelope, with
//! the combined elements re-sorted and re-paged so the response is
//! structurally indistinguishable from what a single node would have
//! produced. Transport, host selection and retries live upstream; the
//! engine only ever sees ordered raw payload strings.
//!
//! ## Modules
//!
//! - **aggregate**: per-format aggregators behind one contract, plus dispatch
//! - **envelope**: static table of known response shapes and shape resolution
//! - **element**: opaque merged elements with normalized field lookup
//! - **sort**: format-agnostic stable sorting and paging
//! - **xml**: owned XML document model for the two XML conventions
//! - **media_type**: content negotiation and fan-out paging helpers
//! - **config**: CLI arguments for the bundled merge tool

pub mod aggregate;
pub mod config;
pub mod element;
pub mod envelope;
pub mod media_type;
pub mod sort;
pub mod types;
pub mod xml;

pub use aggregate::{aggregate, dispatch, AggregationRequest, PageRequest};
pub use envelope::EnvelopeShape;
pub use types::{AggregateError, Result, WireFormat};
