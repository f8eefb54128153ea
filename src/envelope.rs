//! Envelope shapes of fleet list responses
//!
//! Every aggregatable response is a list wrapped in a shape-specific
//! envelope. The wrapper names, nesting paths and repeated-element names
//! differ per wire format but are fixed per shape, so they live here as one
//! static table shared by all aggregators. Anything that matches no known
//! wrapper is handled as a generic list.

use std::fmt;

use crate::types::{AggregateError, Result, WireFormat};

/// Known list shapes produced by the fronted execution servers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    ProcessDefinitionList,
    ProcessInstanceList,
    TaskSummaryList,
    KieContainerList,
    /// Fallback for responses with no recognized wrapper; the top-level
    /// sequence itself is the collection.
    GenericList,
}

impl EnvelopeShape {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProcessDefinitionList => "process-definition-list",
            Self::ProcessInstanceList => "process-instance-list",
            Self::TaskSummaryList => "task-summary-list",
            Self::KieContainerList => "kie-container-list",
            Self::GenericList => "generic-list",
        }
    }
}

impl fmt::Display for EnvelopeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Envelope naming for one shape in one wire format
///
/// `wrapper` is the document's top-level key or root tag, `path` the fixed
/// descent from the wrapper down to the node holding the collection, and
/// `element` the repeated child key/tag. For JSON the wrapper is implicit:
/// the first path segment (or the element key itself for flat shapes)
/// identifies the shape.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeNames {
    pub wrapper: &'static str,
    pub path: &'static [&'static str],
    pub element: &'static str,
}

/// Static description of one known shape across all three formats
#[derive(Debug)]
pub struct ShapeSpec {
    pub shape: EnvelopeShape,
    pub json: EnvelopeNames,
    pub jaxb: EnvelopeNames,
    pub xstream: EnvelopeNames,
}

impl ShapeSpec {
    pub fn names(&self, format: WireFormat) -> &EnvelopeNames {
        match format {
            WireFormat::Json => &self.json,
            WireFormat::JaxbXml => &self.jaxb,
            WireFormat::XstreamXml => &self.xstream,
        }
    }
}

/// The shape table. Wrapper and element identifiers are wire-protocol
/// constants of the fronted servers and are reproduced verbatim, including
/// the fully-qualified legacy type identifiers used as tags by the XStream
/// convention.
pub const SHAPES: &[ShapeSpec] = &[
    ShapeSpec {
        shape: EnvelopeShape::ProcessDefinitionList,
        json: EnvelopeNames {
            wrapper: "processes",
            path: &[],
            element: "processes",
        },
        jaxb: EnvelopeNames {
            wrapper: "process-definitions",
            path: &[],
            element: "processes",
        },
        xstream: EnvelopeNames {
            wrapper: "org.kie.server.api.model.definition.ProcessDefinitionList",
            path: &["processes"],
            element: "org.kie.server.api.model.definition.ProcessDefinition",
        },
    },
    ShapeSpec {
        shape: EnvelopeShape::ProcessInstanceList,
        json: EnvelopeNames {
            wrapper: "process-instance",
            path: &[],
            element: "process-instance",
        },
        jaxb: EnvelopeNames {
            wrapper: "process-instance-list",
            path: &[],
            element: "process-instance",
        },
        xstream: EnvelopeNames {
            wrapper: "org.kie.server.api.model.instance.ProcessInstanceList",
            path: &["processInstances"],
            element: "org.kie.server.api.model.instance.ProcessInstance",
        },
    },
    ShapeSpec {
        shape: EnvelopeShape::TaskSummaryList,
        json: EnvelopeNames {
            wrapper: "task-summary",
            path: &[],
            element: "task-summary",
        },
        jaxb: EnvelopeNames {
            wrapper: "task-summary-list",
            path: &[],
            element: "task-summary",
        },
        xstream: EnvelopeNames {
            wrapper: "org.kie.server.api.model.instance.TaskSummaryList",
            path: &["tasks"],
            element: "org.kie.server.api.model.instance.TaskSummary",
        },
    },
    ShapeSpec {
        shape: EnvelopeShape::KieContainerList,
        json: EnvelopeNames {
            wrapper: "result",
            path: &["result", "kie-containers"],
            element: "kie-container",
        },
        jaxb: EnvelopeNames {
            wrapper: "response",
            path: &["kie-containers"],
            element: "kie-container",
        },
        xstream: EnvelopeNames {
            wrapper: "org.kie.server.api.model.ServiceResponse",
            path: &["result"],
            element: "kie-container",
        },
    },
];

/// Look up the spec for an XML root tag in the given format
pub fn by_xml_wrapper(format: WireFormat, root_tag: &str) -> Option<&'static ShapeSpec> {
    SHAPES
        .iter()
        .find(|spec| spec.names(format).wrapper == root_tag)
}

/// What one payload says about the request's shape
#[derive(Debug, Clone, Copy)]
pub enum ShapeVerdict {
    /// Wrapper recognized; the payload pins the request to this shape.
    Shape(&'static ShapeSpec),
    /// Structurally a list but no known wrapper.
    Generic,
    /// Nothing recognizable (e.g. an empty JSON object); the payload
    /// neither pins nor contradicts a shape.
    None,
}

/// Shape resolution outcome for a whole request
#[derive(Debug, Clone, Copy)]
pub struct ResolvedShape {
    pub shape: EnvelopeShape,
    /// Table row for known shapes; `None` for the generic fallback.
    pub spec: Option<&'static ShapeSpec>,
    /// Index of the payload whose envelope becomes the rebuild template.
    pub template: usize,
}

impl ResolvedShape {
    pub fn is_generic(&self) -> bool {
        self.spec.is_none()
    }
}

/// Combine per-payload verdicts into one resolved shape.
///
/// The first payload with a verdict wins and becomes the template; later
/// verdicts must agree or the whole call fails before any merging. When no
/// payload has a verdict the request degrades to an empty generic list.
pub fn resolve(verdicts: &[ShapeVerdict]) -> Result<ResolvedShape> {
    let mut resolved: Option<ResolvedShape> = None;
    for (index, verdict) in verdicts.iter().enumerate() {
        let shape = match *verdict {
            ShapeVerdict::Shape(spec) => ResolvedShape {
                shape: spec.shape,
                spec: Some(spec),
                template: index,
            },
            ShapeVerdict::Generic => ResolvedShape {
                shape: EnvelopeShape::GenericList,
                spec: None,
                template: index,
            },
            ShapeVerdict::None => continue,
        };
        match resolved {
            None => resolved = Some(shape),
            Some(first) if first.shape == shape.shape => {}
            Some(first) => {
                return Err(AggregateError::ShapeMismatch {
                    first: first.shape.name().to_string(),
                    other: shape.shape.name().to_string(),
                })
            }
        }
    }
    Ok(resolved.unwrap_or(ResolvedShape {
        shape: EnvelopeShape::GenericList,
        spec: None,
        template: 0,
    }))
}
