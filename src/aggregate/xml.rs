//! XML convention aggregators
//!
//! Two XML conventions share one implementation, differing only in the
//! envelope naming they look up in the shape table. The plain convention
//! uses kebab-case wrappers (`<process-definitions>`, `<task-summary-list>`);
//! the qualified-tag convention wraps lists and elements in fully-qualified
//! legacy type identifiers (`<org.kie.server.api.model.instance.TaskSummary>`)
//! which are matched and reproduced as opaque strings.
//!
//! Merging splices element subtrees between documents: the first
//! shape-resolving payload becomes the template, its collection node is
//! emptied and refilled with the merged elements, and everything else in
//! the envelope stays as the node produced it.

use tracing::debug;

use crate::aggregate::{apply_sort_and_page, AggregationRequest, FormatAggregator};
use crate::element::Element;
use crate::envelope::{self, ResolvedShape, ShapeVerdict};
use crate::types::{AggregateError, Result, WireFormat};
use crate::xml::{self, XmlElement};

pub struct XmlAggregator {
    format: WireFormat,
}

impl XmlAggregator {
    pub const fn new(format: WireFormat) -> Self {
        Self { format }
    }

    fn parse(index: usize, payload: &str) -> Result<XmlElement> {
        xml::parse(payload).map_err(|e| AggregateError::MalformedPayload {
            index,
            reason: e.to_string(),
        })
    }

    fn sniff(&self, root: &XmlElement) -> ShapeVerdict {
        match envelope::by_xml_wrapper(self.format, &root.name) {
            Some(spec) => ShapeVerdict::Shape(spec),
            // an XML document always has a root, so an unknown wrapper is a
            // generic list of whatever children it carries
            None => ShapeVerdict::Generic,
        }
    }

    /// Ordered elements of one payload under the resolved shape. A missing
    /// nesting path or collection tag means zero elements.
    pub fn extract_elements(&self, root: &XmlElement, resolved: &ResolvedShape) -> Vec<Element> {
        let Some(spec) = resolved.spec else {
            return root.child_elements().cloned().map(Element::Xml).collect();
        };

        let names = spec.names(self.format);
        let mut node = root;
        for segment in names.path {
            match node.child(segment) {
                Some(next) => node = next,
                None => return Vec::new(),
            }
        }
        node.child_elements()
            .filter(|el| el.name == names.element)
            .cloned()
            .map(Element::Xml)
            .collect()
    }

    /// Rebuild one document under the resolved envelope on top of the
    /// template payload.
    pub fn rebuild(
        &self,
        template: &XmlElement,
        resolved: &ResolvedShape,
        elements: Vec<Element>,
    ) -> Result<String> {
        let mut doc = template.clone();
        {
            let node = match resolved.spec {
                Some(spec) => {
                    let names = spec.names(self.format);
                    let mut cursor = &mut doc;
                    for segment in names.path {
                        cursor = cursor.child_or_insert(segment);
                    }
                    cursor.retain_elements(|el| el.name != names.element);
                    cursor
                }
                None => {
                    doc.retain_elements(|_| false);
                    &mut doc
                }
            };
            for element in elements {
                if let Element::Xml(el) = element {
                    node.push_element(el);
                }
            }
        }
        xml::to_document(&doc).map_err(|e| AggregateError::MalformedPayload {
            index: resolved.template,
            reason: e.to_string(),
        })
    }
}

impl FormatAggregator for XmlAggregator {
    fn format(&self) -> WireFormat {
        self.format
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

        let verdicts: Vec<ShapeVerdict> = docs.iter().map(|doc| self.sniff(doc)).collect();
        let resolved = envelope::resolve(&verdicts)?;

        let mut elements = Vec::new();
        for doc in &docs {
            elements.extend(self.extract_elements(doc, &resolved));
        }
        debug!(
            format = %self.format,
            shape = %resolved.shape,
            total = elements.len(),
            "merged XML elements"
        );

        let elements = apply_sort_and_page(elements, request, &resolved);
        self.rebuild(&docs[resolved.template], &resolved, elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION_LIST_TAG: &str = "org.kie.server.api.model.definition.ProcessDefinitionList";
    const DEFINITION_TAG: &str = "org.kie.server.api.model.definition.ProcessDefinition";
    const INSTANCE_LIST_TAG: &str = "org.kie.server.api.model.instance.ProcessInstanceList";
    const INSTANCE_TAG: &str = "org.kie.server.api.model.instance.ProcessInstance";
    const TASK_LIST_TAG: &str = "org.kie.server.api.model.instance.TaskSummaryList";
    const TASK_TAG: &str = "org.kie.server.api.model.instance.TaskSummary";
    const SERVICE_RESPONSE_TAG: &str = "org.kie.server.api.model.ServiceResponse";

    fn jaxb() -> XmlAggregator {
        XmlAggregator::new(WireFormat::JaxbXml)
    }

    fn xstream() -> XmlAggregator {
        XmlAggregator::new(WireFormat::XstreamXml)
    }

    fn aggregate(aggregator: &XmlAggregator, payloads: &[String]) -> XmlElement {
        aggregate_with(aggregator, payloads, &AggregationRequest::new())
    }

    fn aggregate_with(
        aggregator: &XmlAggregator,
        payloads: &[String],
        request: &AggregationRequest,
    ) -> XmlElement {
        let merged = aggregator.aggregate(payloads, request).unwrap();
        xml::parse(&merged).unwrap()
    }

    fn jaxb_defs(ids: &[&str]) -> String {
        let entries: String = ids
            .iter()
            .map(|id| {
                format!(
                    "<processes>\
                       <process-id>{id}</process-id>\
                       <process-name>Process {id}</process-name>\
                       <package>org.example.demo</package>\
                       <container-id>demo_1.0</container-id>\
                     </processes>"
                )
            })
            .collect();
        format!("<process-definitions>{entries}</process-definitions>")
    }

    fn jaxb_instances(ids: &[u64]) -> String {
        let entries: String = ids
            .iter()
            .map(|id| {
                format!(
                    "<process-instance>\
                       <process-instance-id>{id}</process-instance-id>\
                       <process-id>demo.process</process-id>\
                       <process-instance-state>1</process-instance-state>\
                     </process-instance>"
                )
            })
            .collect();
        format!("<process-instance-list>{entries}</process-instance-list>")
    }

    fn jaxb_tasks(ids: &[u64]) -> String {
        let entries: String = ids
            .iter()
            .map(|id| {
                format!(
                    "<task-summary>\
                       <task-id>{id}</task-id>\
                       <task-name>task {id}</task-name>\
                       <task-status>Reserved</task-status>\
                     </task-summary>"
                )
            })
            .collect();
        format!("<task-summary-list>{entries}</task-summary-list>")
    }

    fn jaxb_containers(ids: &[&str]) -> String {
        let entries: String = ids
            .iter()
            .map(|id| format!(r#"<kie-container container-id="{id}" status="STARTED"/>"#))
            .collect();
        format!(
            r#"<response type="SUCCESS" msg="List of created containers"><kie-containers>{entries}</kie-containers></response>"#
        )
    }

    fn xstream_defs(ids: &[&str]) -> String {
        let entries: String = ids
            .iter()
            .map(|id| {
                format!(
                    "<{DEFINITION_TAG}>\
                       <id>{id}</id>\
                       <name>Process {id}</name>\
                       <containerId>demo_1.0</containerId>\
                     </{DEFINITION_TAG}>"
                )
            })
            .collect();
        format!("<{DEFINITION_LIST_TAG}><processes>{entries}</processes></{DEFINITION_LIST_TAG}>")
    }

    fn xstream_instances(ids: &[u64]) -> String {
        let entries: String = ids
            .iter()
            .map(|id| {
                format!(
                    "<{INSTANCE_TAG}><id>{id}</id><processId>demo.process</processId></{INSTANCE_TAG}>"
                )
            })
            .collect();
        format!(
            "<{INSTANCE_LIST_TAG}><processInstances>{entries}</processInstances></{INSTANCE_LIST_TAG}>"
        )
    }

    fn xstream_tasks(ids: &[u64]) -> String {
        let entries: String = ids
            .iter()
            .map(|id| format!("<{TASK_TAG}><id>{id}</id><status>Reserved</status></{TASK_TAG}>"))
            .collect();
        format!("<{TASK_LIST_TAG}><tasks>{entries}</tasks></{TASK_LIST_TAG}>")
    }

    fn xstream_containers(ids: &[&str]) -> String {
        let entries: String = ids
            .iter()
            .map(|id| format!(r#"<kie-container container-id="{id}" status="STARTED"/>"#))
            .collect();
        format!(
            "<{SERVICE_RESPONSE_TAG}>\
               <type>SUCCESS</type>\
               <msg>List of created containers</msg>\
               <result>{entries}</result>\
             </{SERVICE_RESPONSE_TAG}>"
        )
    }

    fn raw_list(values: &[&str]) -> String {
        let entries: String = values
            .iter()
            .map(|v| format!("<sql-timestamp>{v}</sql-timestamp>"))
            .collect();
        format!("<list>{entries}</list>")
    }

    fn payloads(raw: &[String]) -> Vec<String> {
        raw.to_vec()
    }

    fn child_ids(list: &XmlElement, element: &str, field: &str) -> Vec<String> {
        list.child_elements()
            .filter(|el| el.name == element)
            .map(|el| el.child(field).unwrap().text())
            .collect()
    }

    #[test]
    fn plain_aggregates_process_definitions() {
        let doc = aggregate(
            &jaxb(),
            &payloads(&[jaxb_defs(&["1", "2"]), jaxb_defs(&["3", "4", "5"])]),
        );
        assert_eq!(doc.name, "process-definitions");
        assert_eq!(
            child_ids(&doc, "processes", "process-id"),
            ["1", "2", "3", "4", "5"]
        );
    }

    #[test]
    fn plain_empty_envelopes_still_merge() {
        let full = jaxb_defs(&["1", "2"]);
        let empty = jaxb_defs(&[]);

        let doc = aggregate(&jaxb(), &payloads(&[full.clone(), empty.clone()]));
        assert_eq!(doc.child_elements().count(), 2);

        let doc = aggregate(&jaxb(), &payloads(&[empty.clone(), full]));
        assert_eq!(doc.child_elements().count(), 2);

        let doc = aggregate(&jaxb(), &payloads(&[empty.clone(), empty]));
        assert_eq!(doc.name, "process-definitions");
        assert_eq!(doc.child_elements().count(), 0);
    }

    #[test]
    fn plain_aggregates_process_instances_and_tasks() {
        let doc = aggregate(
            &jaxb(),
            &payloads(&[jaxb_instances(&[1, 2, 3]), jaxb_instances(&[4])]),
        );
        assert_eq!(doc.name, "process-instance-list");
        assert_eq!(doc.child_elements().count(), 4);

        let doc = aggregate(&jaxb(), &payloads(&[jaxb_tasks(&[1, 2, 3]), jaxb_tasks(&[4, 5])]));
        assert_eq!(doc.name, "task-summary-list");
        assert_eq!(doc.child_elements().count(), 5);
    }

    #[test]
    fn plain_aggregates_containers_and_keeps_envelope_siblings() {
        let doc = aggregate(
            &jaxb(),
            &payloads(&[
                jaxb_containers(&["a", "b", "c"]),
                jaxb_containers(&["d", "e", "f"]),
            ]),
        );
        assert_eq!(doc.name, "response");
        assert_eq!(doc.attribute("type"), Some("SUCCESS"));
        let containers = doc.child("kie-containers").unwrap();
        assert_eq!(containers.child_elements().count(), 6);
    }

    #[test]
    fn plain_empty_container_envelope_contributes_nothing() {
        let empty = r#"<response type="SUCCESS" msg="ok"><kie-containers/></response>"#.to_string();
        let doc = aggregate(&jaxb(), &payloads(&[empty, jaxb_containers(&["a", "b", "c"])]));
        let containers = doc.child("kie-containers").unwrap();
        assert_eq!(containers.child_elements().count(), 3);
    }

    #[test]
    fn plain_sorts_and_pages() {
        let batch = payloads(&[jaxb_defs(&["1", "2"]), jaxb_defs(&["3", "4", "5"])]);

        let doc = aggregate_with(
            &jaxb(),
            &batch,
            &AggregationRequest::new().sorted_by("ProcessId", true).paged(0, 2),
        );
        assert_eq!(child_ids(&doc, "processes", "process-id"), ["1", "2"]);

        let doc = aggregate_with(
            &jaxb(),
            &batch,
            &AggregationRequest::new().sorted_by("ProcessId", false).paged(0, 2),
        );
        assert_eq!(child_ids(&doc, "processes", "process-id"), ["5", "4"]);

        let doc = aggregate_with(
            &jaxb(),
            &batch,
            &AggregationRequest::new().sorted_by("ProcessId", true).paged(1, 2),
        );
        assert_eq!(child_ids(&doc, "processes", "process-id"), ["3", "4"]);

        let doc = aggregate_with(
            &jaxb(),
            &batch,
            &AggregationRequest::new().sorted_by("ProcessId", false).paged(1, 2),
        );
        assert_eq!(child_ids(&doc, "processes", "process-id"), ["3", "2"]);

        let doc = aggregate_with(
            &jaxb(),
            &batch,
            &AggregationRequest::new().sorted_by("ProcessId", true).paged(5, 2),
        );
        assert_eq!(doc.name, "process-definitions");
        assert_eq!(doc.child_elements().count(), 0);
    }

    #[test]
    fn qualified_aggregates_process_definitions() {
        let doc = aggregate(
            &xstream(),
            &payloads(&[xstream_defs(&["1", "2"]), xstream_defs(&["3", "4", "5"])]),
        );
        assert_eq!(doc.name, DEFINITION_LIST_TAG);
        let list = doc.child("processes").unwrap();
        assert_eq!(child_ids(list, DEFINITION_TAG, "id"), ["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn qualified_empty_envelopes_still_merge() {
        let full = xstream_instances(&[1]);
        let empty = format!("<{INSTANCE_LIST_TAG}><processInstances/></{INSTANCE_LIST_TAG}>");

        let doc = aggregate(&xstream(), &payloads(&[full, empty.clone()]));
        assert_eq!(doc.child("processInstances").unwrap().child_elements().count(), 1);

        let doc = aggregate(&xstream(), &payloads(&[empty.clone(), empty]));
        assert_eq!(doc.name, INSTANCE_LIST_TAG);
        assert_eq!(doc.child("processInstances").unwrap().child_elements().count(), 0);
    }

    #[test]
    fn qualified_aggregates_instances_and_tasks() {
        let doc = aggregate(
            &xstream(),
            &payloads(&[xstream_instances(&[1]), xstream_instances(&[2, 3])]),
        );
        assert_eq!(doc.child("processInstances").unwrap().child_elements().count(), 3);

        let doc = aggregate(
            &xstream(),
            &payloads(&[xstream_tasks(&[1, 2]), xstream_tasks(&[3, 4, 5])]),
        );
        assert_eq!(doc.name, TASK_LIST_TAG);
        assert_eq!(doc.child("tasks").unwrap().child_elements().count(), 5);
    }

    #[test]
    fn qualified_aggregates_containers() {
        let doc = aggregate(
            &xstream(),
            &payloads(&[
                xstream_containers(&["a", "b", "c"]),
                xstream_containers(&["d", "e", "f"]),
            ]),
        );
        assert_eq!(doc.name, SERVICE_RESPONSE_TAG);
        assert_eq!(doc.child("type").unwrap().text(), "SUCCESS");
        let result = doc.child("result").unwrap();
        assert_eq!(result.child_elements().count(), 6);
    }

    #[test]
    fn qualified_sorts_by_alias_field() {
        let batch = payloads(&[xstream_defs(&["1", "2"]), xstream_defs(&["3", "4", "5"])]);

        // the qualified convention spells the key field as a bare <id>
        let doc = aggregate_with(
            &xstream(),
            &batch,
            &AggregationRequest::new().sorted_by("ProcessId", true).paged(0, 2),
        );
        let list = doc.child("processes").unwrap();
        assert_eq!(child_ids(list, DEFINITION_TAG, "id"), ["1", "2"]);

        let doc = aggregate_with(
            &xstream(),
            &batch,
            &AggregationRequest::new().sorted_by("ProcessId", false).paged(1, 2),
        );
        let list = doc.child("processes").unwrap();
        assert_eq!(child_ids(list, DEFINITION_TAG, "id"), ["3", "2"]);
    }

    #[test]
    fn raw_lists_merge_as_generic_lists() {
        let doc = aggregate(
            &xstream(),
            &payloads(&[
                raw_list(&["2021-01-01", "2021-01-02", "2021-01-03"]),
                raw_list(&["2021-02-01", "2021-02-02"]),
            ]),
        );
        assert_eq!(doc.name, "list");
        assert_eq!(doc.child_elements().count(), 5);
    }

    #[test]
    fn raw_lists_page_without_a_sort_field() {
        let batch = payloads(&[
            raw_list(&["2021-01-01", "2021-01-02", "2021-01-03"]),
            raw_list(&["2021-02-01", "2021-02-02"]),
        ]);
        let doc = aggregate_with(
            &xstream(),
            &batch,
            &AggregationRequest::new().paged(1, 2),
        );
        let values: Vec<String> = doc.child_elements().map(XmlElement::text).collect();
        assert_eq!(values, ["2021-01-03", "2021-02-01"]);

        // a sort field over raw values passes through unchanged
        let doc = aggregate_with(
            &xstream(),
            &batch,
            &AggregationRequest::new().sorted_by("id", true).paged(0, 2),
        );
        let values: Vec<String> = doc.child_elements().map(XmlElement::text).collect();
        assert_eq!(values, ["2021-01-01", "2021-01-02"]);
    }

    #[test]
    fn single_payload_is_reproduced() {
        let payload = jaxb_tasks(&[7, 8]);
        let doc = aggregate(&jaxb(), &payloads(&[payload.clone()]));
        assert_eq!(doc, xml::parse(&payload).unwrap());
    }

    #[test]
    fn mixed_shapes_are_rejected() {
        let err = jaxb()
            .aggregate(
                &payloads(&[jaxb_defs(&["1"]), jaxb_tasks(&[2])]),
                &AggregationRequest::new(),
            )
            .unwrap_err();
        assert!(matches!(err, AggregateError::ShapeMismatch { .. }));

        // a raw list cannot be merged with a typed envelope either
        let err = jaxb()
            .aggregate(
                &payloads(&[jaxb_defs(&["1"]), raw_list(&["x"])]),
                &AggregationRequest::new(),
            )
            .unwrap_err();
        assert!(matches!(err, AggregateError::ShapeMismatch { .. }));
    }

    #[test]
    fn malformed_payloads_report_their_position() {
        let err = xstream()
            .aggregate(
                &payloads(&[xstream_tasks(&[1]), "<broken>".to_string()]),
                &AggregationRequest::new(),
            )
            .unwrap_err();
        match err {
            AggregateError::MalformedPayload { index, .. } => assert_eq!(index, 1),
            other => panic!("expected MalformedPayload, got {other:?}"),
        }
    }
}
