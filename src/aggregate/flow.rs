use crate::domain::record::{DisplacementStatus, PathwayStage, SolutionsPathway};
use crate::filters::FilteredView;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A node of the status -> pathway -> stage flow diagram.
///
/// Variant order is column order in the diagram, so sorting nodes or edges
/// lays them out left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlowNode {
    Status(DisplacementStatus),
    Pathway(SolutionsPathway),
    /// Terminal node for records with no pathway chosen yet.
    NotYetDetermined,
    Stage(PathwayStage),
}

impl FlowNode {
    pub fn label(&self) -> &'static str {
        match self {
            FlowNode::Status(s) => s.label(),
            FlowNode::Pathway(p) => p.label(),
            FlowNode::NotYetDetermined => "Not Yet Determined",
            FlowNode::Stage(s) => s.label(),
        }
    }
}

impl fmt::Display for FlowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for FlowNode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlowEdge {
    pub from: FlowNode,
    pub to: FlowNode,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowGraph {
    /// Every node touched by an edge, in diagram order.
    pub nodes: Vec<FlowNode>,
    /// Status -> pathway edges first, then pathway -> stage edges.
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    pub fn inflow(&self, node: FlowNode) -> usize {
        self.edges.iter().filter(|e| e.to == node).map(|e| e.count).sum()
    }

    pub fn outflow(&self, node: FlowNode) -> usize {
        self.edges.iter().filter(|e| e.from == node).map(|e| e.count).sum()
    }

    pub fn edge(&self, from: FlowNode, to: FlowNode) -> Option<usize> {
        self.edges
            .iter()
            .find(|e| e.from == from && e.to == to)
            .map(|e| e.count)
    }
}

/// Counts records along displacement status -> pathway -> stage.
///
/// Every record contributes exactly one first-hop edge, so no record is lost:
/// those without a pathway flow into `NotYetDetermined`, which has no outgoing edges.
/// Every pathway record has a stage, so pathway nodes conserve flow.
pub fn aggregate_flow(view: &FilteredView<'_>) -> FlowGraph {
    let mut counts: BTreeMap<(FlowNode, FlowNode), usize> = BTreeMap::new();

    for rec in view.iter() {
        let status = FlowNode::Status(rec.displacement_status);
        match rec.pathway {
            Some(p) => {
                let pathway = FlowNode::Pathway(p.kind);
                *counts.entry((status, pathway)).or_default() += 1;
                *counts.entry((pathway, FlowNode::Stage(p.stage))).or_default() += 1;
            }
            None => {
                *counts.entry((status, FlowNode::NotYetDetermined)).or_default() += 1;
            }
        }
    }

    let nodes: BTreeSet<FlowNode> = counts.keys().flat_map(|(a, b)| [*a, *b]).collect();
    let edges = counts
        .into_iter()
        .map(|((from, to), count)| FlowEdge { from, to, count })
        .collect();

    FlowGraph {
        nodes: nodes.into_iter().collect(),
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::apply;
    use crate::domain::selection::FilterSelection;
    use crate::tests::utils::{fixture_store, store_from_rows};

    #[test]
    fn test_flow_counts_and_ordering() {
        let store = store_from_rows(&[
            "B1,2024-01-10,Bay,Baidoa,IDP,Return,Implementation,5,Female,Emergency,Yes,Partial,3.11,43.65",
            "B2,2024-01-12,Bay,Baidoa,IDP,Return,Achieved,4,Male,Permanent,No,Complete,3.12,43.66",
            "B3,2024-02-01,Lower Juba,Kismayo,Returnee,,,3,Male,Transitional,No,Complete,,",
        ]);
        let view = apply(&FilterSelection::unrestricted(), &store);
        let flow = aggregate_flow(&view);

        let idp = FlowNode::Status(DisplacementStatus::Idp);
        let ret = FlowNode::Pathway(SolutionsPathway::Return);
        assert_eq!(flow.edge(idp, ret), Some(2));
        assert_eq!(
            flow.edge(ret, FlowNode::Stage(PathwayStage::Implementation)),
            Some(1)
        );
        assert_eq!(flow.edge(ret, FlowNode::Stage(PathwayStage::Achieved)), Some(1));
        assert_eq!(
            flow.edge(
                FlowNode::Status(DisplacementStatus::Returnee),
                FlowNode::NotYetDetermined
            ),
            Some(1)
        );

        // first-hop edges come before second-hop edges
        let first_second_hop = flow
            .edges
            .iter()
            .position(|e| matches!(e.from, FlowNode::Pathway(_)))
            .unwrap();
        assert!(flow.edges[..first_second_hop]
            .iter()
            .all(|e| matches!(e.from, FlowNode::Status(_))));
        assert_eq!(flow.nodes.first(), Some(&idp));
    }

    #[test]
    fn test_flow_is_conserved_at_every_pathway_node() {
        let store = fixture_store();
        let view = apply(&FilterSelection::unrestricted(), &store);
        let flow = aggregate_flow(&view);

        for node in &flow.nodes {
            if let FlowNode::Pathway(p) = node {
                let reaching = view
                    .iter()
                    .filter(|r| r.solutions_pathway() == Some(*p))
                    .count();
                assert_eq!(flow.inflow(*node), reaching);
                assert_eq!(flow.outflow(*node), reaching);
            }
        }

        let sources: usize = flow
            .nodes
            .iter()
            .filter(|n| matches!(n, FlowNode::Status(_)))
            .map(|n| flow.outflow(*n))
            .sum();
        assert_eq!(sources, view.len());
        assert_eq!(flow.outflow(FlowNode::NotYetDetermined), 0);
    }

    #[test]
    fn test_empty_view_has_no_edges() {
        let store = fixture_store();
        let sel = FilterSelection::unrestricted().with_regions(["Nowhere"]);
        let flow = aggregate_flow(&apply(&sel, &store));
        assert!(flow.edges.is_empty());
        assert!(flow.nodes.is_empty());
    }
}
