//! Typed access to the ShearStream telemetry API.
//!
//! Requests either go through this crate's `/api/proxy` endpoint, which
//! attaches credentials server-side, or straight to the API with a bearer
//! token supplied by the caller.
//!
//! ```no_run
//! use shearstream_proxy::telemetry::{TelemetryClient, TimeseriesQuery};
//!
//! # async fn example() -> Result<(), shearstream_proxy::telemetry::Error> {
//! let client = TelemetryClient::via_proxy("https://dashboard.example.com/api/proxy")?;
//! let project = client.project(413).await?;
//! let jobs = client.project_jobs(project.id).await?;
//!
//! if let Some(job) = jobs.first() {
//!     let query = TimeseriesQuery::new(["wellheadPressure", "slurryRate"]);
//!     let series = client.timeseries_data(job.id, &query).await?;
//!     println!("{} points", series.data.len());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod types;

pub use client::{TelemetryClient, TimeseriesQuery};
pub use error::Error;
pub use types::*;
