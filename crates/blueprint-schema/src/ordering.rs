//! Registration ordering for blueprint batches.
//!
//! A catalog backend refuses a relation whose target blueprint does not exist
//! yet. Blueprints are ordered so targets come first; relations that cannot be
//! satisfied in a single pass (self references, cycles) are split off and
//! attached once every blueprint is registered.

use crate::model::{Blueprint, Relation};
use indexmap::IndexMap;
use petgraph::algo::condensation;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use tracing::{debug, warn};

/// A relation to attach in the second phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeferredRelation {
    /// Blueprint owning the relation.
    pub blueprint: String,
    /// Relation name.
    pub name: String,
    pub relation: Relation,
}

/// Two-phase registration plan.
///
/// Phase one blueprints are not relation-free: they already carry every
/// relation whose target precedes them, and only the rest is deferred.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrationPlan {
    /// Phase one, in order. Each blueprint keeps only relations whose
    /// target is registered before it.
    pub blueprints: Vec<Blueprint>,
    /// Phase two: relations attached after all blueprints exist.
    pub deferred: Vec<DeferredRelation>,
    /// Identifier groups that reference each other circularly.
    pub cycles: Vec<Vec<String>>,
}

impl RegistrationPlan {
    /// Identifiers in registration order.
    pub fn order(&self) -> Vec<&str> {
        self.blueprints
            .iter()
            .map(|b| b.identifier.as_str())
            .collect()
    }

    /// Position of a blueprint in the registration order.
    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.blueprints
            .iter()
            .position(|b| b.identifier == identifier)
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }
}

/// Order blueprints so relation targets are registered before referrers.
///
/// Ties keep document order. Relations to undeclared identifiers are
/// deferred, since nothing in the batch can satisfy them; run
/// [`crate::validation::validate`] first to reject those.
pub fn resolve_order(blueprints: &[Blueprint]) -> RegistrationPlan {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let mut index_of: HashMap<&str, usize> = HashMap::new();
    let mut self_referencing: HashSet<usize> = HashSet::new();

    let nodes: Vec<NodeIndex> = (0..blueprints.len()).map(|i| graph.add_node(i)).collect();
    for (i, blueprint) in blueprints.iter().enumerate() {
        index_of.entry(blueprint.identifier.as_str()).or_insert(i);
    }

    // Edges run from dependency to dependent
    for (i, blueprint) in blueprints.iter().enumerate() {
        for target in blueprint.targets() {
            if let Some(&t) = index_of.get(target) {
                if t == i {
                    self_referencing.insert(i);
                }
                graph.add_edge(nodes[t], nodes[i], ());
            }
        }
    }

    let condensed = condensation(graph, true);

    let mut cycles = Vec::new();
    for members in condensed.node_weights() {
        if members.len() > 1 || self_referencing.contains(&members[0]) {
            let mut members = members.clone();
            members.sort_unstable();
            cycles.push(
                members
                    .iter()
                    .map(|&i| blueprints[i].identifier.clone())
                    .collect::<Vec<_>>(),
            );
        }
    }
    cycles.sort();
    if !cycles.is_empty() {
        warn!(
            "Circular relations detected between blueprints: {:?}",
            cycles
        );
    }

    // Kahn's algorithm over components, smallest document index first
    let mut in_degree: HashMap<NodeIndex, usize> = condensed
        .node_indices()
        .map(|n| (n, condensed.edges_directed(n, Direction::Incoming).count()))
        .collect();
    let first_index = |n: NodeIndex| condensed[n].iter().copied().min().unwrap_or(usize::MAX);

    let mut ready: BinaryHeap<Reverse<(usize, NodeIndex)>> = in_degree
        .iter()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(&n, _)| Reverse((first_index(n), n)))
        .collect();

    let mut order: Vec<usize> = Vec::with_capacity(blueprints.len());
    while let Some(Reverse((_, component))) = ready.pop() {
        let mut members = condensed[component].clone();
        members.sort_unstable();
        order.extend(members);

        for next in condensed.neighbors_directed(component, Direction::Outgoing) {
            if let Some(degree) = in_degree.get_mut(&next) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse((first_index(next), next)));
                }
            }
        }
    }

    let mut registered: HashSet<&str> = HashSet::new();
    let mut plan = RegistrationPlan {
        cycles,
        ..Default::default()
    };

    for i in order {
        let blueprint = &blueprints[i];
        let mut immediate: IndexMap<String, Relation> = IndexMap::new();

        for (name, relation) in blueprint.relations() {
            if registered.contains(relation.target.as_str()) {
                immediate.insert(name.clone(), relation.clone());
            } else {
                debug!(
                    "Deferring relation {}.{} -> {}",
                    blueprint.identifier, name, relation.target
                );
                plan.deferred.push(DeferredRelation {
                    blueprint: blueprint.identifier.clone(),
                    name: name.clone(),
                    relation: relation.clone(),
                });
            }
        }

        let mut phase_one = blueprint.clone();
        if phase_one.relations.is_some() {
            phase_one.relations = Some(immediate);
        }
        plan.blueprints.push(phase_one);
        registered.insert(blueprint.identifier.as_str());
    }

    plan
}
