use tracing::info;

use crate::model::MapType;
use crate::simulation::Event;

use super::SimulationCallback;

/// Tallies the run: counts per event type and the acceptance ratio.
#[derive(Debug, Clone, Default)]
pub struct SummaryCallback {
    counts: MapType<&'static str, u64>,
}

impl SummaryCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, event_type: &str) -> u64 {
        self.counts.get(event_type).copied().unwrap_or(0)
    }

    /// Accepted requests over handled requests, if any were handled.
    pub fn acceptance_ratio(&self) -> Option<f64> {
        let accepted = self.count("RequestAcceptanceEvent");
        let rejected = self.count("RequestRejectionEvent");
        let handled = accepted + rejected;
        (handled > 0).then(|| accepted as f64 / handled as f64)
    }
}

impl<L> SimulationCallback<L> for SummaryCallback {
    fn visit_event(&mut self, event: &Event<L>) {
        *self.counts.entry(event.event_type()).or_insert(0) += 1;
    }

    fn finalize(&mut self) -> anyhow::Result<()> {
        for (event_type, count) in &self.counts {
            info!(event_type, count, "event tally");
        }
        if let Some(ratio) = self.acceptance_ratio() {
            info!(acceptance_ratio = ratio, "request outcome");
        }
        Ok(())
    }
}
