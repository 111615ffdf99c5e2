//! Traversal strategies
//!
//! Every strategy is a combination of three choices:
//! - how the root children seed the search (`Roots`)
//! - how the work list grows (`Order`)
//! - whether clauses restart the whole extraction
//!
//! At each visited node the anchored gold mentions are offered first, then
//! the anchored named entities, then the node itself.

use std::collections::VecDeque;

use coref_core::{DocumentGraph, NodeId, TagSet};

use crate::{Anchors, TraversalStrategy, Validator};

/// Work list discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Children appended at the back (level order)
    Breadth,
    /// Children pushed at the front (depth first)
    Deep,
}

/// Seeding policy for the root children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Roots {
    /// All children in one shared search
    Plain,
    /// Noun phrase children searched before the rest
    Preference,
    /// An independent search per child
    PerChild,
}

/// Configurable traversal strategy
#[derive(Debug, Clone)]
pub struct Traversal {
    name: &'static str,
    order: Order,
    roots: Roots,
    subordinate_restart: bool,
}

impl Traversal {
    /// Create a new traversal
    pub fn new(name: &'static str, order: Order, roots: Roots) -> Self {
        Self {
            name,
            order,
            roots,
            subordinate_restart: false,
        }
    }

    /// Restart the extraction at every visited clause
    pub fn with_subordinate_restart(mut self) -> Self {
        self.subordinate_restart = true;
        self
    }

    pub fn breadth_first() -> Self {
        Self::new("breadth_first", Order::Breadth, Roots::Plain)
    }

    pub fn breadth_first_preference() -> Self {
        Self::new("breadth_first_preference", Order::Breadth, Roots::Preference)
    }

    pub fn breadth_first_subordinate() -> Self {
        Self::new("breadth_first_subordinate", Order::Breadth, Roots::Plain).with_subordinate_restart()
    }

    pub fn breadth_first_per_child() -> Self {
        Self::new("breadth_first_per_child", Order::Breadth, Roots::PerChild)
    }

    pub fn breadth_first_per_child_subordinate() -> Self {
        Self::new("breadth_first_per_child_subordinate", Order::Breadth, Roots::PerChild)
            .with_subordinate_restart()
    }

    pub fn deep_first() -> Self {
        Self::new("deep_first", Order::Deep, Roots::Plain)
    }

    pub fn deep_first_subordinate() -> Self {
        Self::new("deep_first_subordinate", Order::Deep, Roots::Plain).with_subordinate_restart()
    }

    fn extract_into(
        &self,
        graph: &dyn DocumentGraph,
        tags: &dyn TagSet,
        root: NodeId,
        anchors: &Anchors,
        validate: &mut Validator<'_>,
        order: &mut Vec<NodeId>,
    ) {
        let children = graph.children_sorted(root);
        match self.roots {
            Roots::Plain => self.visit(graph, tags, children.into(), anchors, validate, order),
            Roots::Preference => {
                let (noun_phrases, rest): (Vec<_>, Vec<_>) = children
                    .into_iter()
                    .partition(|c| tags.is_noun_phrase(graph.node(*c).tag_str()));
                self.visit(graph, tags, noun_phrases.into(), anchors, validate, order);
                self.visit(graph, tags, rest.into(), anchors, validate, order);
            }
            Roots::PerChild => {
                for child in children {
                    self.visit(graph, tags, VecDeque::from([child]), anchors, validate, order);
                }
            }
        }
    }

    fn offer(node: NodeId, validate: &mut Validator<'_>, order: &mut Vec<NodeId>) {
        if validate(node, order) {
            order.push(node);
        }
    }

    fn visit(
        &self,
        graph: &dyn DocumentGraph,
        tags: &dyn TagSet,
        mut nodes: VecDeque<NodeId>,
        anchors: &Anchors,
        validate: &mut Validator<'_>,
        order: &mut Vec<NodeId>,
    ) {
        while let Some(node) = nodes.pop_front() {
            for &gold in anchors.gold_at(node) {
                Self::offer(gold, validate, order);
            }
            for &entity in anchors.named_entities_at(node) {
                Self::offer(entity, validate, order);
            }
            Self::offer(node, validate, order);

            if self.subordinate_restart && tags.is_clause(graph.node(node).tag_str()) {
                self.extract_into(graph, tags, node, anchors, validate, order);
                continue;
            }
            let children = graph.children_sorted(node);
            match self.order {
                Order::Breadth => nodes.extend(children),
                Order::Deep => {
                    for child in children.into_iter().rev() {
                        nodes.push_front(child);
                    }
                }
            }
        }
    }
}

impl TraversalStrategy for Traversal {
    fn name(&self) -> &str {
        self.name
    }

    fn extract(
        &self,
        graph: &dyn DocumentGraph,
        tags: &dyn TagSet,
        root: NodeId,
        anchors: &Anchors,
        validate: &mut Validator<'_>,
    ) -> Vec<NodeId> {
        let mut order = Vec::new();
        self.extract_into(graph, tags, root, anchors, validate, &mut order);
        order
    }
}
