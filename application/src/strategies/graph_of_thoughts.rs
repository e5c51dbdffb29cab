//! Graph of thoughts.
//!
//! The reasoning graph is planned up front from [`GraphOptions`] and then
//! filled layer by layer: every node's prompt is built from the contents of
//! its parents, found through typed edges. Nodes in one layer are
//! independent and may be filled concurrently. The filled graph is returned
//! with the decision so it can be stored on the question result.
//!
//! [`GraphOptions`]: medqa_domain::GraphOptions

use super::{Decision, RecoverableError, Stage, StageError, StageRunner, Strategy, non_empty};
use crate::config::RunConfig;
use async_trait::async_trait;
use medqa_domain::{
    EdgeType, GraphPromptTemplate, NodeType, QuestionRecord, StrategyKind, ThoughtGraph, ThoughtNode,
    parse_answer,
};
use tracing::debug;

pub struct GraphOfThoughts;

#[async_trait]
impl Strategy for GraphOfThoughts {
    fn kind(&self) -> StrategyKind {
        StrategyKind::GraphOfThoughts
    }

    async fn decide(&self, question: &QuestionRecord, runner: &mut StageRunner<'_>) -> Result<Decision, StageError> {
        let config = runner.context().config.as_ref();
        let mut graph = ThoughtGraph::plan(config.graph);

        for layer in graph.layers() {
            let is_decision = layer
                .iter()
                .any(|&id| graph.nodes[id].node_type == NodeType::Decision);
            if is_decision {
                continue;
            }

            let stages = layer
                .iter()
                .map(|&id| node_stage(&graph, &graph.nodes[id], question, config))
                .collect();
            let contents = runner
                .run_independent(stages, |_, raw| non_empty(raw))
                .await?;
            for (id, content) in layer.into_iter().zip(contents) {
                graph.nodes[id].content = content;
            }
        }

        let decision_id = graph
            .decision()
            .map(|node| node.id)
            .unwrap_or(graph.nodes.len().saturating_sub(1));
        let stage = node_stage(&graph, &graph.nodes[decision_id], question, config);
        let (answer, content) = runner
            .run_parsed(stage, |raw| {
                parse_answer(raw)
                    .map(|letter| (letter, raw.to_string()))
                    .map_err(RecoverableError::answer)
            })
            .await?;
        graph.nodes[decision_id].content = content;
        debug!("Graph decision: {}", answer);

        Ok(Decision {
            answer,
            graph: Some(graph),
        })
    }
}

fn content_of(nodes: &[&ThoughtNode]) -> String {
    nodes
        .iter()
        .map(|n| n.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompt and sampling settings for one node, from its parents' contents.
fn node_stage(graph: &ThoughtGraph, node: &ThoughtNode, question: &QuestionRecord, config: &RunConfig) -> Stage {
    let parents = move |edge_type: EdgeType| graph.parents_by(node.id, edge_type);

    let (prompt, max_tokens) = match (node.node_type, node.option) {
        (NodeType::Initialize, _) => (GraphPromptTemplate::initialize(question), config.max_output_tokens),
        (NodeType::Hypothesis, Some(letter)) => {
            let analysis = content_of(&parents(EdgeType::Generates));
            (
                GraphPromptTemplate::hypothesis(question, &analysis, letter),
                config.max_output_tokens,
            )
        }
        (NodeType::Evidence, Some(letter)) => {
            let hypothesis = content_of(&parents(EdgeType::Supports));
            (
                GraphPromptTemplate::evidence(question, letter, &hypothesis),
                config.max_output_tokens,
            )
        }
        (NodeType::Refinement, Some(letter)) => {
            let hypothesis = content_of(&parents(EdgeType::Refines));
            let evidence = content_of(&parents(EdgeType::Informs));
            let competitors: Vec<_> = parents(EdgeType::CrossPollinates)
                .into_iter()
                .filter_map(|other_evidence| {
                    let other = other_evidence.option?;
                    let other_hypothesis = graph
                        .nodes_of_type(NodeType::Hypothesis)
                        .find(|h| h.option == Some(other))
                        .map(|h| h.content.as_str())
                        .unwrap_or_default();
                    Some((other, other_hypothesis, other_evidence.content.as_str()))
                })
                .collect();
            (
                GraphPromptTemplate::refinement(question, letter, &hypothesis, &evidence, &competitors),
                config.max_output_tokens,
            )
        }
        (NodeType::Aggregation, _) => {
            let analyses: Vec<_> = parents(EdgeType::Aggregates)
                .into_iter()
                .filter_map(|n| n.option.map(|letter| (letter, n.content.as_str())))
                .collect();
            (
                GraphPromptTemplate::aggregation(question, &analyses),
                config.aggregator_max_tokens,
            )
        }
        (NodeType::Decision, _) => {
            let aggregation = content_of(&parents(EdgeType::Concludes));
            (
                GraphPromptTemplate::decision(question, &aggregation),
                config.decision_max_tokens,
            )
        }
        // Per-option node types are always planned with an option.
        (_, None) => (GraphPromptTemplate::initialize(question), config.max_output_tokens),
    };

    Stage::new(node.stage_name(), prompt, node.temperature, max_tokens)
}
