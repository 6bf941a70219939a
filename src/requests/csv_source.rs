use std::path::Path;

use serde::Deserialize;

use crate::model::{Request, RequestId, TransportationRequest};
use crate::space::R2Loc;

use super::read_csv;

/// One CSV row describing a planar transportation request. Window columns
/// are optional and default to fully open.
#[derive(Debug, Deserialize)]
struct RequestRecord {
    request_id: RequestId,
    creation_timestamp: f64,
    origin_x: f64,
    origin_y: f64,
    destination_x: f64,
    destination_y: f64,
    pickup_timewindow_min: Option<f64>,
    pickup_timewindow_max: Option<f64>,
    delivery_timewindow_min: Option<f64>,
    delivery_timewindow_max: Option<f64>,
}

impl From<RequestRecord> for Request<R2Loc> {
    fn from(record: RequestRecord) -> Self {
        Request::Transportation(TransportationRequest {
            request_id: record.request_id,
            creation_timestamp: record.creation_timestamp,
            origin: (record.origin_x, record.origin_y),
            destination: (record.destination_x, record.destination_y),
            pickup_timewindow_min: record.pickup_timewindow_min.unwrap_or(0.0),
            pickup_timewindow_max: record
                .pickup_timewindow_max
                .unwrap_or(f64::INFINITY),
            delivery_timewindow_min: record.delivery_timewindow_min.unwrap_or(0.0),
            delivery_timewindow_max: record
                .delivery_timewindow_max
                .unwrap_or(f64::INFINITY),
        })
    }
}

/// Load planar requests from a CSV file. The simulator requires
/// non-decreasing creation timestamps, so unordered files are rejected.
pub fn read_requests_csv(path: impl AsRef<Path>) -> anyhow::Result<Vec<Request<R2Loc>>> {
    let records: Vec<RequestRecord> = read_csv(path)?;
    let requests: Vec<Request<R2Loc>> = records.into_iter().map(Into::into).collect();
    anyhow::ensure!(
        requests
            .windows(2)
            .all(|pair| pair[0].creation_timestamp() <= pair[1].creation_timestamp()),
        "requests must be ordered by creation timestamp"
    );
    Ok(requests)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp_csv(name: &str, content: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("requests_{}_{}.csv", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_rows_with_and_without_windows() {
        let path = write_temp_csv(
            "parses",
            "request_id,creation_timestamp,origin_x,origin_y,destination_x,destination_y,pickup_timewindow_min,pickup_timewindow_max,delivery_timewindow_min,delivery_timewindow_max\n\
             0,0.0,0.0,0.0,0.0,1.0,,,,\n\
             1,0.5,0.1,0.2,0.3,0.4,0.5,2.5,0.5,5.0\n",
        );
        let requests = read_requests_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(requests.len(), 2);
        let Request::Transportation(first) = &requests[0] else {
            unreachable!()
        };
        assert_eq!(first.origin, (0.0, 0.0));
        assert!(first.pickup_timewindow_max.is_infinite());
        let Request::Transportation(second) = &requests[1] else {
            unreachable!()
        };
        assert_eq!(second.pickup_timewindow_max, 2.5);
        assert_eq!(second.delivery_timewindow_max, 5.0);
    }

    #[test]
    fn out_of_order_rows_are_rejected() {
        let path = write_temp_csv(
            "unordered",
            "request_id,creation_timestamp,origin_x,origin_y,destination_x,destination_y,pickup_timewindow_min,pickup_timewindow_max,delivery_timewindow_min,delivery_timewindow_max\n\
             0,5.0,0.0,0.0,0.0,1.0,,,,\n\
             1,0.5,0.1,0.2,0.3,0.4,,,,\n",
        );
        let result = read_requests_csv(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
