//! Inter-region routing: the connector graph and the route planner on top of it.

mod connectors;
mod route;
mod planner;

#[cfg(test)]
mod tests;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use connectors::{Connector, ConnectorGraph, ConnectorId, ConnectorKind};
pub use route::{ConnectorEdge, Edge, Route, RoutePlan};
pub use planner::RoutePlanner;
