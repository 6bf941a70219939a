use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::simulation::Event;

use super::{dump_json_lines, SimulationCallback};

/// Buffers every event of a run and writes them as one JSON-lines file when
/// the run finalizes.
#[derive(Debug, Clone)]
pub struct EventLogCallback {
    path: PathBuf,
    records: Vec<serde_json::Value>,
}

impl EventLogCallback {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }
}

impl<L: Serialize> SimulationCallback<L> for EventLogCallback {
    fn visit_event(&mut self, event: &Event<L>) {
        self.records.push(
            serde_json::to_value(event).expect("events serialize without errors"),
        );
    }

    fn finalize(&mut self) -> anyhow::Result<()> {
        dump_json_lines(&self.path, &self.records)?;
        info!(
            path = %self.path.display(),
            n_events = self.records.len(),
            "wrote event log"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VehicleId;

    #[test]
    fn writes_one_json_object_per_event() {
        let mut path = std::env::temp_dir();
        path.push(format!("event_log_{}.jsonl", std::process::id()));

        let mut callback = EventLogCallback::new(&path);
        SimulationCallback::visit_event(
            &mut callback,
            &Event::begin(0.0, VehicleId(0), 0.5_f64),
        );
        SimulationCallback::visit_event(&mut callback, &Event::<f64>::rejection(1.0, 3));
        SimulationCallback::<f64>::finalize(&mut callback).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event_type"], "VehicleStateBeginEvent");
    }
}
