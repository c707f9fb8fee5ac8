use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::node::{Document, Node};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Block,
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildConstraint {
    BlockOnly,
    InlineOnly,
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: String,
    pub role: NodeRole,
    pub children: ChildConstraint,
}

impl NodeSpec {
    pub fn text_block(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            role: NodeRole::Block,
            children: ChildConstraint::InlineOnly,
        }
    }

    pub fn container(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            role: NodeRole::Block,
            children: ChildConstraint::BlockOnly,
        }
    }
}

/// The set of element kinds a document runtime can represent. Capability
/// queries against this table drive the toolbar's feature gating.
#[derive(Default)]
pub struct NodeRegistry {
    specs: HashMap<String, NodeSpec>,
}

impl NodeRegistry {
    pub fn new(specs: impl IntoIterator<Item = NodeSpec>) -> Result<Self, String> {
        let mut registry = Self::default();
        for spec in specs {
            if registry.specs.contains_key(&spec.kind) {
                return Err(format!("Duplicate node spec kind: {}", spec.kind));
            }
            registry.specs.insert(spec.kind.clone(), spec);
        }
        Ok(registry)
    }

    /// The full inventory of the hosted rich-text runtime.
    pub fn richtext() -> Self {
        Self::new([
            NodeSpec::text_block("paragraph"),
            NodeSpec::text_block("heading"),
            NodeSpec::text_block("quote"),
            NodeSpec::text_block("aside"),
            NodeSpec::text_block("code_block"),
            NodeSpec::text_block("list_item"),
            NodeSpec::container("list"),
        ])
        .expect("richtext registry must be valid")
    }

    /// Paragraph-only inventory, for hosts without structural formatting.
    pub fn core() -> Self {
        Self::new([NodeSpec::text_block("paragraph")])
            .expect("core registry must be valid")
    }

    pub fn node_specs(&self) -> &HashMap<String, NodeSpec> {
        &self.specs
    }

    pub fn spec(&self, kind: &str) -> Option<&NodeSpec> {
        self.specs.get(kind)
    }

    pub fn is_known_kind(&self, kind: &str) -> bool {
        self.specs.contains_key(kind)
    }

    /// Structural validation of a subtree about to be inserted: kinds must be
    /// registered and each element's children must satisfy its constraint.
    pub fn validate_node(&self, node: &Node) -> Result<(), String> {
        let Node::Element(el) = node else {
            return Ok(());
        };

        let Some(spec) = self.specs.get(&el.kind) else {
            return Err(format!("Unknown node kind: {}", el.kind));
        };

        for child in &el.children {
            match (&spec.children, child) {
                (ChildConstraint::InlineOnly, Node::Element(child_el)) => {
                    return Err(format!(
                        "{} may not contain element children (found {})",
                        el.kind, child_el.kind
                    ));
                }
                (ChildConstraint::BlockOnly, Node::Text(_)) => {
                    return Err(format!("{} may not contain bare text", el.kind));
                }
                _ => {}
            }
            self.validate_node(child)?;
        }
        Ok(())
    }

    /// Validates every element in a document, used when previewing mutation
    /// requests. Top-level children must be block-role elements.
    pub fn validate_document(&self, doc: &Document) -> Result<(), String> {
        for child in &doc.children {
            match child {
                Node::Element(el) => {
                    if self.spec(&el.kind).map(|s| &s.role) == Some(&NodeRole::Inline) {
                        return Err(format!("{} may not appear at the top level", el.kind));
                    }
                }
                Node::Text(_) => {
                    return Err("Bare text may not appear at the top level".into());
                }
            }
            self.validate_node(child)?;
        }
        Ok(())
    }
}
