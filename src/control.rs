// Operator actions: add, delete and look up routes

use std::sync::Arc;

use crate::bird::{RouteDaemon, StaticRoute};
use crate::error::AppResult;
use crate::publisher::RecordPublisher;
use crate::routes::lookup::LookupService;
use crate::routes::{PublishedEntry, RouteRecord};

/// Route type recorded for operator-added routes
const MANUAL_ROUTE_TYPE: &str = "unicast";

pub struct RouteController {
    daemon: Arc<dyn RouteDaemon>,
    publisher: RecordPublisher,
    lookup: LookupService,
}

impl RouteController {
    pub fn new(daemon: Arc<dyn RouteDaemon>, publisher: RecordPublisher, lookup: LookupService) -> Self {
        RouteController {
            daemon,
            publisher,
            lookup,
        }
    }

    /// Install the route in BIRD, then publish it. Nothing is published if BIRD
    /// rejects the route.
    ///
    /// The published entry carries empty `next_hop`/`interface`; those fields
    /// are only filled from what BIRD reports on the next sync cycle.
    pub async fn add_route(&self, route: &StaticRoute) -> AppResult<RouteRecord> {
        self.daemon.apply_route(route).await?;

        let record = RouteRecord {
            network: route.network.clone(),
            route_type: MANUAL_ROUTE_TYPE.to_string(),
            source_protocol: route.source_protocol.clone(),
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            preference: route.preference,
            next_hop: None,
            interface: None,
        };
        self.publisher.publish_one(&record).await?;
        Ok(record)
    }

    /// Withdraw the route from BIRD. The published entry is left to expire.
    pub async fn delete_route(&self, network: &str) -> AppResult<()> {
        self.daemon.withdraw_route(network).await?;
        tracing::info!(
            "Route {} withdrawn, store entry {} expires on its own",
            network,
            self.publisher.key_for(network)
        );
        Ok(())
    }

    /// Look up routes published by this node
    pub async fn lookup_route(&self, network: &str) -> AppResult<Vec<PublishedEntry>> {
        self.lookup_node_route(self.publisher.node_id(), network).await
    }

    /// Look up routes published by any node
    pub async fn lookup_node_route(&self, node_id: &str, network: &str) -> AppResult<Vec<PublishedEntry>> {
        let entries = self.lookup.lookup(node_id, network).await?;
        tracing::info!("Lookup {} on node {}: {} result(s)", network, node_id, entries.len());
        Ok(entries)
    }
}
