use std::path::Path;

use serde::de::DeserializeOwned;

pub mod generator;
pub mod csv_source;

pub use csv_source::read_requests_csv;
pub use generator::RandomRequestGenerator;

fn read_csv<T>(path: impl AsRef<Path>) -> anyhow::Result<Vec<T>>
where
    T: DeserializeOwned,
{
    let mut reader = csv::Reader::from_path(path)?;
    let records: csv::Result<Vec<T>> = reader.deserialize().collect();
    Ok(records?)
}
