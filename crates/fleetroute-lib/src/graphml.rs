//! GraphML terrain import.
//!
//! Attributes are declared once with `<key id=".." for="node|edge" attr.name="..">`
//! and attached to elements with `<data key="..">`. Recognised names:
//!
//! - nodes: `terrain` / `terrain_type`, `hazard`, `severity`
//! - edges: `distance`, `length`, `energy`, `directed`
//!
//! Other attributes are ignored. The result is an ordinary [`GraphDocument`],
//! so validation is shared with the JSON loader.

use std::collections::{BTreeMap, HashMap};

use roxmltree::{Document, Node as XmlNode};

use crate::error::{Error, Result};
use crate::graph::{EdgeRecord, GraphDocument, NodeRecord};
use crate::hazard::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Domain {
    Node,
    Edge,
    All,
}

impl Domain {
    fn covers(self, element: Domain) -> bool {
        self == Domain::All || self == element
    }
}

#[derive(Debug)]
struct Key {
    name: String,
    domain: Domain,
    default: Option<String>,
}

/// Parse GraphML text into a graph document.
pub fn graphml_document(xml: &str) -> Result<GraphDocument> {
    let doc = Document::parse(xml)
        .map_err(|err| Error::malformed(format!("unreadable GraphML document: {err}")))?;
    let root = doc.root_element();
    if !root.has_tag_name("graphml") {
        return Err(Error::malformed(format!(
            "expected a <graphml> root element, found <{}>",
            root.tag_name().name()
        )));
    }

    let keys = declared_keys(root);
    let graph = root
        .children()
        .find(|child| child.has_tag_name("graph"))
        .ok_or_else(|| Error::malformed("GraphML document has no <graph> element"))?;

    let mut document = GraphDocument {
        directed: graph.attribute("edgedefault") == Some("directed"),
        ..GraphDocument::default()
    };
    for element in graph.children().filter(XmlNode::is_element) {
        if element.has_tag_name("node") {
            let data = data_values(element, &keys, Domain::Node);
            document.nodes.push(node_record(element, data)?);
        } else if element.has_tag_name("edge") {
            let data = data_values(element, &keys, Domain::Edge);
            let index = document.edges.len();
            document.edges.push(edge_record(element, data, index)?);
        }
    }

    tracing::debug!(
        keys = keys.len(),
        nodes = document.nodes.len(),
        edges = document.edges.len(),
        "GraphML document read"
    );
    Ok(document)
}

fn declared_keys(root: XmlNode<'_, '_>) -> HashMap<String, Key> {
    root.children()
        .filter(|child| child.has_tag_name("key"))
        .filter_map(|key| {
            let id = key.attribute("id")?;
            let domain = match key.attribute("for") {
                Some("node") => Domain::Node,
                Some("edge") => Domain::Edge,
                Some("all") | None => Domain::All,
                Some(_) => return None,
            };
            let default = key
                .children()
                .find(|child| child.has_tag_name("default"))
                .and_then(|child| child.text())
                .map(|text| text.trim().to_string());
            let key = Key {
                name: key.attribute("attr.name").unwrap_or(id).to_string(),
                domain,
                default,
            };
            Some((id.to_string(), key))
        })
        .collect()
}

/// Attribute values by name: key defaults first, then explicit `<data>`.
fn data_values(
    element: XmlNode<'_, '_>,
    keys: &HashMap<String, Key>,
    domain: Domain,
) -> BTreeMap<String, String> {
    let mut values: BTreeMap<String, String> = keys
        .values()
        .filter(|key| key.domain.covers(domain))
        .filter_map(|key| Some((key.name.clone(), key.default.clone()?)))
        .collect();

    for data in element.children().filter(|child| child.has_tag_name("data")) {
        let Some(id) = data.attribute("key") else {
            continue;
        };
        let name = keys.get(id).map_or(id, |key| key.name.as_str());
        let text = data.text().unwrap_or_default().trim().to_string();
        values.insert(name.to_string(), text);
    }
    values.retain(|_, value| !value.is_empty());
    values
}

fn node_record(element: XmlNode<'_, '_>, mut data: BTreeMap<String, String>) -> Result<NodeRecord> {
    let id = element.attribute("id").map(str::to_string);
    let severity = data
        .remove("severity")
        .map(|value| {
            value.parse::<Severity>().map_err(|err| {
                Error::malformed(format!(
                    "node {} has an invalid severity: {err}",
                    id.as_deref().unwrap_or("?")
                ))
            })
        })
        .transpose()?;

    Ok(NodeRecord {
        terrain: data.remove("terrain").or_else(|| data.remove("terrain_type")),
        hazard: data.remove("hazard"),
        severity,
        id,
    })
}

fn edge_record(
    element: XmlNode<'_, '_>,
    data: BTreeMap<String, String>,
    index: usize,
) -> Result<EdgeRecord> {
    let number = |name: &str| -> Result<Option<f64>> {
        data.get(name)
            .map(|value| {
                value.parse::<f64>().map_err(|_| {
                    Error::malformed(format!("edge #{index} has a non-numeric {name} '{value}'"))
                })
            })
            .transpose()
    };
    let directed = element
        .attribute("directed")
        .or_else(|| data.get("directed").map(String::as_str))
        .map(|value| match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(Error::malformed(format!(
                "edge #{index} has an invalid directed flag '{other}'"
            ))),
        })
        .transpose()?;

    Ok(EdgeRecord {
        source: element.attribute("source").map(str::to_string),
        target: element.attribute("target").map(str::to_string),
        distance: number("distance")?,
        length: number("length")?,
        energy: number("energy")?,
        directed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d0" for="node" attr.name="terrain_type" attr.type="string"/>
  <key id="d1" for="edge" attr.name="length" attr.type="double"/>
  <key id="d2" for="edge" attr.name="energy" attr.type="double"/>
  <key id="d3" for="node" attr.name="severity" attr.type="string"/>
  <key id="d4" for="graph" attr.name="name" attr.type="string"/>
  <graph edgedefault="undirected">
    <data key="d4">sample</data>
    <node id="A"><data key="d0">plain</data></node>
    <node id="B"><data key="d0">ridge</data><data key="d3">high</data></node>
    <edge source="A" target="B"><data key="d1">3.5</data><data key="d2">1.0</data></edge>
    <edge source="B" target="A" directed="true"><data key="d1">9</data></edge>
  </graph>
</graphml>"#;

    #[test]
    fn keys_map_onto_records() {
        let document = graphml_document(SAMPLE).unwrap();
        assert!(!document.directed);
        assert_eq!(document.nodes.len(), 2);
        assert_eq!(document.nodes[0].terrain.as_deref(), Some("plain"));
        assert_eq!(document.nodes[1].severity, Some(Severity::High));

        let first = &document.edges[0];
        assert_eq!(first.length, Some(3.5));
        assert_eq!(first.distance, None);
        assert_eq!(first.energy, Some(1.0));
        assert_eq!(first.directed, None);
        assert_eq!(document.edges[1].directed, Some(true));
    }

    #[test]
    fn key_defaults_apply_when_data_is_absent() {
        let xml = r#"<graphml>
  <key id="t" for="node" attr.name="terrain"><default>regolith</default></key>
  <graph edgedefault="directed"><node id="A"/></graph>
</graphml>"#;
        let document = graphml_document(xml).unwrap();
        assert!(document.directed);
        assert_eq!(document.nodes[0].terrain.as_deref(), Some("regolith"));
    }

    #[test]
    fn non_numeric_cost_is_malformed() {
        let xml = r#"<graphml>
  <key id="d1" for="edge" attr.name="length"/>
  <graph><node id="A"/><node id="B"/>
    <edge source="A" target="B"><data key="d1">far</data></edge>
  </graph>
</graphml>"#;
        let err = graphml_document(xml).unwrap_err();
        assert!(err.to_string().contains("non-numeric length 'far'"), "{err}");
    }

    #[test]
    fn wrong_root_is_malformed() {
        let err = graphml_document("<svg/>").unwrap_err();
        assert!(matches!(err, Error::MalformedGraph { .. }));
    }
}
