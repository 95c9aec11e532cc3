//! Dependency graph for the dashboard's update cycle.
//!
//! The callback wiring of the UI is written down as an explicit node/edge
//! list, and a change to either selector is turned into a topologically
//! ordered recompute plan. The invariant that matters: `ProvinceValue` is
//! upstream of every province-dependent output, so a department change can
//! never recompute a chart against the stale province.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Departamento,
    Provincia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    /// Province dropdown option set, derived from the department.
    ProvinceOptions,
    /// The effective province value after the reset/clamp rule.
    ProvinceValue,
    ProvincePie,
    SummaryTable,
    TotalLabel,
    DistrictBar,
    YearLine,
    AgeBar,
    SexPie,
}

/// All nodes in one fixed evaluation order; used as the tie-break when the
/// topological sort has several ready nodes.
pub const NODES: [Node; 9] = [
    Node::ProvinceOptions,
    Node::ProvinceValue,
    Node::ProvincePie,
    Node::SummaryTable,
    Node::TotalLabel,
    Node::DistrictBar,
    Node::YearLine,
    Node::AgeBar,
    Node::SexPie,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Input(Input),
    Node(Node),
}

/// Static edge list: which inputs and nodes feed each node.
pub fn upstreams(node: Node) -> &'static [Upstream] {
    match node {
        Node::ProvinceOptions => &[Upstream::Input(Input::Departamento)],
        Node::ProvinceValue => &[
            Upstream::Node(Node::ProvinceOptions),
            Upstream::Input(Input::Provincia),
        ],
        Node::ProvincePie | Node::SummaryTable | Node::TotalLabel => {
            &[Upstream::Input(Input::Departamento)]
        }
        Node::DistrictBar | Node::YearLine | Node::AgeBar | Node::SexPie => &[
            Upstream::Input(Input::Departamento),
            Upstream::Node(Node::ProvinceValue),
        ],
    }
}

/// Nodes affected by a change to `changed`, in topological order.
pub fn plan(changed: Input) -> Vec<Node> {
    // Transitive closure over the edge list.
    let mut dirty: HashSet<Node> = HashSet::new();
    loop {
        let mut grew = false;
        for n in NODES {
            if dirty.contains(&n) {
                continue;
            }
            let affected = upstreams(n).iter().any(|u| match u {
                Upstream::Input(i) => *i == changed,
                Upstream::Node(m) => dirty.contains(m),
            });
            if affected {
                dirty.insert(n);
                grew = true;
            }
        }
        if !grew {
            break;
        }
    }

    // Kahn-style emit: a dirty node is ready once none of its dirty
    // upstreams are still pending. NODES order breaks ties, which keeps the
    // plan deterministic.
    let mut order: Vec<Node> = Vec::with_capacity(dirty.len());
    let mut emitted: HashSet<Node> = HashSet::new();
    while emitted.len() < dirty.len() {
        let before = emitted.len();
        for n in NODES {
            if !dirty.contains(&n) || emitted.contains(&n) {
                continue;
            }
            let ready = upstreams(n).iter().all(|u| match u {
                Upstream::Input(_) => true,
                Upstream::Node(m) => !dirty.contains(m) || emitted.contains(m),
            });
            if ready {
                order.push(n);
                emitted.insert(n);
            }
        }
        // The edge list is acyclic, so every pass makes progress.
        debug_assert!(emitted.len() > before, "dependency cycle in edge list");
        if emitted.len() == before {
            break;
        }
    }
    order
}
