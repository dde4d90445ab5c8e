//! Property Tests for Pipeline Structure

mod common;

use common::Shape;
use proptest::prelude::*;
use sluice_core::{NodeId, Pipeline};

/// One node to add: how many slots it has, and which earlier node feeds
/// each slot (as an index into the nodes built so far).
#[derive(Debug, Clone)]
struct Plan {
    feeds: Vec<usize>,
    sink: bool,
}

fn plan() -> impl Strategy<Value = Plan> {
    (prop::collection::vec(any::<usize>(), 0..3), any::<bool>())
        .prop_map(|(feeds, sink)| Plan { feeds, sink })
}

/// Build a pipeline from plans. Slots only draw from earlier non-sink
/// nodes; a node that would have no possible producer becomes a source.
fn build(plans: &[Plan]) -> (Pipeline, Vec<NodeId>) {
    let mut p = Pipeline::new();
    let mut producers: Vec<NodeId> = Vec::new();
    let mut ids = Vec::new();

    for (i, plan) in plans.iter().enumerate() {
        let name = format!("n{i}");
        if producers.is_empty() || plan.feeds.is_empty() {
            let id = p.create_node(Shape::source(&name));
            producers.push(id);
            ids.push(id);
            continue;
        }

        let arity = plan.feeds.len();
        let id = if plan.sink {
            p.create_node(Shape::sink(&name, arity))
        } else {
            p.create_node(Shape::component(&name, arity))
        };
        for (slot, pick) in plan.feeds.iter().enumerate() {
            let src = producers[pick % producers.len()];
            p.connect(src, id, slot).unwrap();
        }
        if !plan.sink {
            producers.push(id);
        }
        ids.push(id);
    }

    (p, ids)
}

/// Every `(producer, consumer)` edge read back from the slot table, sorted.
fn edges(p: &Pipeline) -> Vec<(u64, u64)> {
    let mut edges: Vec<(u64, u64)> = p
        .node_ids()
        .flat_map(|consumer| {
            p.slots(consumer)
                .unwrap()
                .iter()
                .flatten()
                .map(move |producer| (producer.raw(), consumer.raw()))
                .collect::<Vec<_>>()
        })
        .collect();
    edges.sort_unstable();
    edges
}

fn handle_of(label: &str) -> u64 {
    label
        .trim()
        .trim_matches('"')
        .split(' ')
        .next()
        .and_then(|id| id.parse().ok())
        .unwrap()
}

/// Recover node handles and edges from DOT text.
fn parse_dot(dot: &str) -> (Vec<u64>, Vec<(u64, u64)>) {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for line in dot.lines().filter(|line| line.starts_with("  \"")) {
        match line.split_once(" -> ") {
            Some((from, to)) => edges.push((handle_of(from), handle_of(to))),
            None => nodes.push(handle_of(line)),
        }
    }
    edges.sort_unstable();
    (nodes, edges)
}

proptest! {
    #[test]
    fn handles_strictly_increase(
        ops in prop::collection::vec(any::<Option<usize>>(), 1..60)
    ) {
        let mut p = Pipeline::new();
        let mut issued: Vec<NodeId> = Vec::new();

        for op in ops {
            match op {
                // Erase an earlier node, live or not.
                Some(pick) if !issued.is_empty() => {
                    let _ = p.erase_node(issued[pick % issued.len()]);
                }
                _ => {
                    let id = p.create_node(Shape::source("s"));
                    prop_assert!(issued.iter().all(|&prev| prev < id));
                    issued.push(id);
                }
            }
        }
    }

    #[test]
    fn connect_then_disconnect_restores_slot(plans in prop::collection::vec(plan(), 1..12)) {
        let (mut p, _) = build(&plans);
        let src = p.create_node(Shape::source("extra"));
        let dst = p.create_node(Shape::sink("consumer", 1));

        p.connect(src, dst, 0).unwrap();
        prop_assert!(p.get_dependencies(src).unwrap().contains(&(dst, 0)));

        p.disconnect(src, dst).unwrap();
        prop_assert_eq!(p.slots(dst).unwrap(), &[None][..]);
        prop_assert!(!p.get_dependencies(src).unwrap().contains(&(dst, 0)));
    }

    #[test]
    fn erase_scrubs_every_reference(
        plans in prop::collection::vec(plan(), 1..16),
        victim in any::<usize>(),
    ) {
        let (mut p, ids) = build(&plans);
        let gone = ids[victim % ids.len()];
        let before = edges(&p);

        p.erase_node(gone).unwrap();

        let after = edges(&p);
        let expected: Vec<_> = before
            .into_iter()
            .filter(|&(from, to)| from != gone.raw() && to != gone.raw())
            .collect();
        prop_assert_eq!(after, expected);
        prop_assert!(p.node_ids().all(|id| id != gone));

        let fresh = p.create_node(Shape::source("fresh"));
        prop_assert!(ids.iter().all(|&id| id < fresh));
    }

    #[test]
    fn dot_round_trips_handles_and_edges(
        plans in prop::collection::vec(plan(), 1..16),
        erase in prop::collection::vec(any::<usize>(), 0..4),
    ) {
        let (mut p, ids) = build(&plans);
        for pick in erase {
            let _ = p.erase_node(ids[pick % ids.len()]);
        }

        let (nodes, dot_edges) = parse_dot(&p.to_string());
        let handles: Vec<u64> = p.node_ids().map(|id| id.raw()).collect();

        prop_assert_eq!(nodes, handles);
        prop_assert_eq!(dot_edges, edges(&p));
    }
}
