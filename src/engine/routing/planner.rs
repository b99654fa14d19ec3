use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use wayfarer_macros::profile;
use crate::engine::config::NavConfig;
use crate::engine::pathfinding::{Location, PathEdge, Region, RegionId};
use super::connectors::{ConnectorGraph, ConnectorId};
use super::route::{ConnectorEdge, Edge, Route, RoutePlan};

/// Cheapest multi-region route over a built world.
///
/// # Search
///
/// Dijkstra over *anchors*: the start location plus "just came out of connector
/// `c`". From an anchor the candidates are every outgoing connector of its
/// region and, when the anchor shares the goal's region, the goal itself.
///
/// Intra-region walks are expensive, so candidates enter the queue with an
/// optimistic key (straight-line distance plus connector cost). Only when such
/// an entry reaches the front is the real walk computed and the entry re-queued
/// with its exact cost. The straight line never overestimates a walk, so the
/// first exact entry to come off the queue is optimal.
///
/// Equal costs resolve to fewer connector hops, then to the candidate
/// discovered first. Discovery order is fixed (goal before connectors, then
/// connector id), so the output is deterministic.
pub struct RoutePlanner<'w> {
    regions: &'w FxHashMap<RegionId, Region>,
    connectors: &'w ConnectorGraph,
    config: &'w NavConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Goal,
    Connector(ConnectorId),
}

/// A settled anchor. Index 0 is the start.
struct Anchor {
    parent: Option<usize>,
    /// Connector that produced this anchor (`None` for the start)
    via: Option<ConnectorId>,
    /// Walk from the parent anchor to `via`'s source
    walk: Option<PathEdge>,
    location: Location,
    cost: f32,
    hops: u32,
}

struct Candidate {
    key: f32,
    hops: u32,
    exact: bool,
    seq: u64,
    anchor: usize,
    target: Target,
    /// Resolved walk from the anchor to the target (only when `exact`)
    walk: Option<PathEdge>,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap. At equal key and hops an estimate goes first
        // so a tie it might produce is resolved before any exact entry settles.
        other.key.total_cmp(&self.key)
            .then_with(|| other.hops.cmp(&self.hops))
            .then_with(|| other.exact.cmp(&self.exact))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Per-request search state.
struct Search<'a> {
    anchors: Vec<Anchor>,
    queue: BinaryHeap<Candidate>,
    settled: FixedBitSet,
    goal: &'a Location,
    seq: u64,
    walks_computed: usize,
}

impl<'w> RoutePlanner<'w> {
    pub fn new(
        regions: &'w FxHashMap<RegionId, Region>,
        connectors: &'w ConnectorGraph,
        config: &'w NavConfig,
    ) -> Self {
        Self { regions, connectors, config }
    }

    /// Plan from `start` to `goal`. Both must already be resolved: known
    /// regions, finite positions inside the bounds.
    #[profile]
    pub fn plan(&self, start: &Location, goal: &Location) -> RoutePlan {
        if start == goal {
            return RoutePlan::AlreadyThere;
        }

        let mut search = Search {
            anchors: vec![Anchor {
                parent: None,
                via: None,
                walk: None,
                location: start.clone(),
                cost: 0.0,
                hops: 0,
            }],
            queue: BinaryHeap::new(),
            settled: FixedBitSet::with_capacity(self.connectors.len()),
            goal,
            seq: 0,
            walks_computed: 0,
        };
        self.expand(&mut search, 0);

        while let Some(candidate) = search.queue.pop() {
            if let Target::Connector(id) = candidate.target {
                if search.settled.contains(id.0 as usize) {
                    continue;
                }
            }

            if !candidate.exact {
                self.resolve(&mut search, candidate);
                continue;
            }

            match candidate.target {
                Target::Goal => {
                    let plan = self.finish(&search, candidate);
                    debug!(
                        "[ROUTE] {} -> {}: {} anchors settled, {} walks computed",
                        start, goal, search.anchors.len(), search.walks_computed
                    );
                    return plan;
                }
                Target::Connector(id) => {
                    search.settled.insert(id.0 as usize);
                    let connector = self.connectors.get(id);
                    search.anchors.push(Anchor {
                        parent: Some(candidate.anchor),
                        via: Some(id),
                        walk: candidate.walk,
                        location: connector.to.clone(),
                        cost: candidate.key,
                        hops: candidate.hops,
                    });
                    let index = search.anchors.len() - 1;
                    self.expand(&mut search, index);
                }
            }
        }

        debug!(
            "[ROUTE] {} -> {}: unreachable after {} anchors, {} walks computed",
            start, goal, search.anchors.len(), search.walks_computed
        );
        RoutePlan::Unreachable
    }

    /// Queue every candidate reachable from a freshly settled anchor.
    fn expand(&self, search: &mut Search<'_>, index: usize) {
        let anchor = &search.anchors[index];
        let Some(region) = self.regions.get(&anchor.location.region) else {
            return;
        };
        let here = anchor.location.position;
        let cost = anchor.cost;
        let hops = anchor.hops;
        let mut pending = Vec::new();

        if anchor.location.region == search.goal.region {
            let there = search.goal.position;
            let exact = region.same_cell(here, there);
            let key = if exact { cost } else { cost + here.distance(there) };
            pending.push((key, hops, exact, Target::Goal));
        }

        for &id in region.connectors() {
            if search.settled.contains(id.0 as usize) {
                continue;
            }
            let connector = self.connectors.get(id);
            let there = connector.from.position;
            let exact = region.same_cell(here, there);
            let walk = if exact { 0.0 } else { here.distance(there) };
            pending.push((cost + walk + connector.cost, hops + 1, exact, Target::Connector(id)));
        }

        for (key, hops, exact, target) in pending {
            search.seq += 1;
            search.queue.push(Candidate { key, hops, exact, seq: search.seq, anchor: index, target, walk: None });
        }
    }

    /// Replace an optimistic candidate with its exact cost, or drop it when the
    /// walk is impossible.
    fn resolve(&self, search: &mut Search<'_>, candidate: Candidate) {
        let anchor = &search.anchors[candidate.anchor];
        let Some(region) = self.regions.get(&anchor.location.region) else {
            return;
        };
        let (there, extra) = match candidate.target {
            Target::Goal => (search.goal.position, 0.0),
            Target::Connector(id) => {
                let connector = self.connectors.get(id);
                (connector.from.position, connector.cost)
            }
        };

        let here = anchor.location.position;
        search.walks_computed += 1;
        let walk = match region.find_path(here, there, self.config) {
            Some(walk) => walk,
            None if region.snaps_together(here, there, self.config) => PathEdge {
                region: region.id().clone(),
                waypoints: vec![here, there],
                cost: here.distance(there),
            },
            None => return,
        };

        search.queue.push(Candidate {
            key: anchor.cost + walk.cost + extra,
            exact: true,
            walk: Some(walk),
            ..candidate
        });
    }

    fn finish(&self, search: &Search<'_>, goal: Candidate) -> RoutePlan {
        let mut edges = Vec::new();
        if let Some(walk) = goal.walk {
            edges.push(Edge::Walk(walk));
        }

        let mut current = Some(goal.anchor);
        while let Some(index) = current {
            let anchor = &search.anchors[index];
            if let Some(id) = anchor.via {
                edges.push(Edge::Connector(ConnectorEdge::from(self.connectors.get(id))));
            }
            if let Some(walk) = &anchor.walk {
                edges.push(Edge::Walk(walk.clone()));
            }
            current = anchor.parent;
        }
        edges.reverse();

        if edges.is_empty() {
            RoutePlan::AlreadyThere
        } else {
            RoutePlan::Found(Route::new(edges))
        }
    }
}
