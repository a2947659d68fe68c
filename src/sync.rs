// Periodic BIRD -> store synchronisation

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::bird::RouteDaemon;
use crate::error::StoreError;
use crate::publisher::RecordPublisher;
use crate::routes::parser;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Outcome of one fetch -> parse -> publish cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub fetched: bool,
    pub parsed: usize,
    pub skipped: usize,
    pub published: usize,
}

pub struct SyncService {
    daemon: Arc<dyn RouteDaemon>,
    publisher: RecordPublisher,
    interval: Duration,
}

impl SyncService {
    pub fn new(daemon: Arc<dyn RouteDaemon>, publisher: RecordPublisher, interval: Duration) -> Self {
        SyncService {
            daemon,
            publisher,
            interval,
        }
    }

    /// Run one cycle. Daemon failures end the cycle with nothing published;
    /// store failures are returned to the caller.
    pub async fn run_cycle(&self) -> Result<CycleReport, StoreError> {
        let mut report = CycleReport::default();

        tracing::info!("Fetching BIRD routes...");
        let output = match self.daemon.fetch_table().await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Error running BIRD route command: {}", e);
                return Ok(report);
            }
        };
        report.fetched = true;

        let parsed = parser::parse_routes(&output);
        for skipped in &parsed.skipped {
            tracing::debug!("Skipped line {}: {:?}", skipped.line_number, skipped.reason);
        }
        report.parsed = parsed.records.len();
        report.skipped = parsed.skipped.len();

        if parsed.records.is_empty() {
            tracing::info!("No routes found in BIRD output");
            return Ok(report);
        }

        tracing::info!(
            "Parsed {} routes ({} lines skipped), sending to the store...",
            report.parsed,
            report.skipped
        );
        report.published = self.publisher.publish(&parsed.records).await?;
        Ok(report)
    }

    /// Cycle forever with a fixed pause between cycles; only returns on a store error
    pub async fn run(&self) -> Result<(), StoreError> {
        tracing::info!(
            "Starting sync loop for node {} every {}s",
            self.publisher.node_id(),
            self.interval.as_secs()
        );

        loop {
            if let Err(e) = self.run_cycle().await {
                tracing::error!("Store failure, stopping sync loop: {}", e);
                return Err(e);
            }

            tracing::info!("Waiting for {} seconds before next update", self.interval.as_secs());
            tokio::time::sleep(self.interval).await;
        }
    }
}
