use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use dyn_clone::DynClone;
use serde::Serialize;

use crate::simulation::Event;

pub mod event_log;
pub mod summary;

pub use event_log::EventLogCallback;
pub use summary::SummaryCallback;

/// Observer hooked into a simulation run. The event stream stays the
/// authoritative output; callbacks are for side channels like persistence
/// and reporting.
pub trait SimulationCallback<L>: DynClone {
    fn visit_event(&mut self, _event: &Event<L>) {}

    /// Called once after the run; flush buffers here.
    fn finalize(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

dyn_clone::clone_trait_object!(<L> SimulationCallback<L>);

/// Serialize `values` as JSON lines, creating parent directories as needed.
pub fn dump_json_lines<T>(path: impl AsRef<Path>, values: &[T]) -> anyhow::Result<()>
where
    T: Serialize,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    for value in values {
        serde_json::to_writer(&mut writer, value)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
