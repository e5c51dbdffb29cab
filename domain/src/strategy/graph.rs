//! Graph-of-thoughts arena
//!
//! Nodes live in a flat `Vec` indexed by integer id; edges reference ids.
//! Every edge points from a lower id to a higher id, which makes the graph
//! acyclic by construction and gives a topological order for free.
//!
//! Full graph for a four-option question (15 nodes):
//!
//! ```text
//! Initialize ─generates→ Hypothesis(X) ─supports→ Evidence(X)
//!                              │                     │  ╲ cross_pollinates → Refinement(Y≠X)
//!                              └──refines→ Refinement(X) ←informs┘
//! Refinement(*) ─aggregates→ Aggregation ─concludes→ Decision
//! ```

use crate::core::question::AnswerLetter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Node types, each bound to a fixed temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Initialize,
    Hypothesis,
    Evidence,
    Refinement,
    Aggregation,
    Decision,
}

impl NodeType {
    /// Sampling temperature for calls that fill this node.
    pub fn temperature(self) -> f32 {
        match self {
            Self::Initialize => 0.7,
            Self::Hypothesis => 1.0,
            Self::Evidence => 0.7,
            Self::Refinement => 0.5,
            Self::Aggregation | Self::Decision => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Hypothesis => "hypothesis",
            Self::Evidence => "evidence",
            Self::Refinement => "refinement",
            Self::Aggregation => "aggregation",
            Self::Decision => "decision",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Generates,
    Supports,
    Refines,
    Informs,
    CrossPollinates,
    Aggregates,
    Concludes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThoughtNode {
    pub id: usize,
    pub node_type: NodeType,
    /// Answer option this node reasons about, for per-option nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option: Option<AnswerLetter>,
    pub temperature: f32,
    pub content: String,
}

impl ThoughtNode {
    /// Stage name used in call traces, e.g. `graph.evidence.B`.
    pub fn stage_name(&self) -> String {
        match self.option {
            Some(letter) => format!("graph.{}.{}", self.node_type.as_str(), letter),
            None => format!("graph.{}", self.node_type.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThoughtEdge {
    pub from_id: usize,
    pub to_id: usize,
    pub edge_type: EdgeType,
}

/// Ablation switches. Both on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    /// Include a refinement node per hypothesis.
    pub refinement: bool,
    /// Feed every other option's evidence into each refinement.
    pub cross_pollination: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            refinement: true,
            cross_pollination: true,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    UnknownNode(usize),

    #[error("edge {from} -> {to} does not point forward")]
    BackwardEdge { from: usize, to: usize },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThoughtGraph {
    pub nodes: Vec<ThoughtNode>,
    pub edges: Vec<ThoughtEdge>,
}

impl ThoughtGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay out the graph for a four-option question with empty contents.
    pub fn plan(options: GraphOptions) -> Self {
        let mut graph = Self::new();
        let init = graph.add_node(NodeType::Initialize, None);

        let hypotheses: Vec<usize> = AnswerLetter::ALL
            .into_iter()
            .map(|letter| {
                let id = graph.add_node(NodeType::Hypothesis, Some(letter));
                graph.link(init, id, EdgeType::Generates);
                id
            })
            .collect();

        let evidence: Vec<usize> = hypotheses
            .iter()
            .zip(AnswerLetter::ALL)
            .map(|(&h, letter)| {
                let id = graph.add_node(NodeType::Evidence, Some(letter));
                graph.link(h, id, EdgeType::Supports);
                id
            })
            .collect();

        let per_option = if options.refinement {
            let mut refinements = Vec::with_capacity(hypotheses.len());
            for (i, letter) in AnswerLetter::ALL.into_iter().enumerate() {
                let id = graph.add_node(NodeType::Refinement, Some(letter));
                graph.link(hypotheses[i], id, EdgeType::Refines);
                graph.link(evidence[i], id, EdgeType::Informs);
                if options.cross_pollination {
                    for (j, &other) in evidence.iter().enumerate() {
                        if j != i {
                            graph.link(other, id, EdgeType::CrossPollinates);
                        }
                    }
                }
                refinements.push(id);
            }
            refinements
        } else {
            evidence
        };

        let aggregation = graph.add_node(NodeType::Aggregation, None);
        for id in per_option {
            graph.link(id, aggregation, EdgeType::Aggregates);
        }
        let decision = graph.add_node(NodeType::Decision, None);
        graph.link(aggregation, decision, EdgeType::Concludes);
        graph
    }

    pub fn add_node(&mut self, node_type: NodeType, option: Option<AnswerLetter>) -> usize {
        let id = self.nodes.len();
        self.nodes.push(ThoughtNode {
            id,
            node_type,
            option,
            temperature: node_type.temperature(),
            content: String::new(),
        });
        id
    }

    /// Add an edge, rejecting unknown ids and edges that do not point forward.
    pub fn add_edge(&mut self, from: usize, to: usize, edge_type: EdgeType) -> Result<(), GraphError> {
        for id in [from, to] {
            if id >= self.nodes.len() {
                return Err(GraphError::UnknownNode(id));
            }
        }
        if from >= to {
            return Err(GraphError::BackwardEdge { from, to });
        }
        self.link(from, to, edge_type);
        Ok(())
    }

    fn link(&mut self, from_id: usize, to_id: usize, edge_type: EdgeType) {
        self.edges.push(ThoughtEdge {
            from_id,
            to_id,
            edge_type,
        });
    }

    pub fn node(&self, id: usize) -> Option<&ThoughtNode> {
        self.nodes.get(id)
    }

    pub fn set_content(&mut self, id: usize, content: impl Into<String>) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(id).ok_or(GraphError::UnknownNode(id))?;
        node.content = content.into();
        Ok(())
    }

    /// Incoming edges of a node, in insertion order.
    pub fn incoming(&self, id: usize) -> impl Iterator<Item = &ThoughtEdge> {
        self.edges.iter().filter(move |e| e.to_id == id)
    }

    /// Parent nodes reached through edges of one type.
    pub fn parents_by(&self, id: usize, edge_type: EdgeType) -> Vec<&ThoughtNode> {
        self.incoming(id)
            .filter(|e| e.edge_type == edge_type)
            .filter_map(|e| self.node(e.from_id))
            .collect()
    }

    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = &ThoughtNode> {
        self.nodes.iter().filter(move |n| n.node_type == node_type)
    }

    /// Group node ids by depth. Nodes in one layer have no edges between
    /// them and can be filled independently.
    pub fn layers(&self) -> Vec<Vec<usize>> {
        let mut depth = vec![0usize; self.nodes.len()];
        // ids are a topological order, so one forward pass suffices
        for id in 0..self.nodes.len() {
            let d = self
                .incoming(id)
                .map(|e| depth[e.from_id] + 1)
                .max()
                .unwrap_or(0);
            depth[id] = d;
        }
        let max_depth = depth.iter().copied().max().unwrap_or(0);
        let mut layers = vec![Vec::new(); if self.nodes.is_empty() { 0 } else { max_depth + 1 }];
        for (id, d) in depth.into_iter().enumerate() {
            layers[d].push(id);
        }
        layers
    }

    /// The decision node, if the graph has one.
    pub fn decision(&self) -> Option<&ThoughtNode> {
        self.nodes_of_type(NodeType::Decision).next()
    }
}
