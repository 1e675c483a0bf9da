//! Library surface of the `anilaye` backend service.
//!
//! The dashboard front-end consumes three collections from the hosted
//! database (`water_points`, `iot_readings`, `payments`) and renders derived
//! views from them. Everything between the raw rows and the JSON handed to
//! the front-end lives here, split so the pure core is testable without a
//! database:
//!
//! - [`models`] – row types and derived view types
//! - [`enrich`] – status derivation (active/inactive, filter state)
//! - [`report`] – reporting periods and KPI aggregation
//! - [`state`]  – snapshot store with last-fetch-wins publication
//! - [`store`]  – the read queries (the only I/O in the crate)
//! - [`schema`] – idempotent table/index setup
//! - [`routes`] – HTTP gateway (EMBP: one subrouter per file)
//! - [`config`] – environment-driven configuration

pub mod config;
pub mod enrich;
pub mod models;
pub mod report;
pub mod routes;
pub mod schema;
pub mod state;
pub mod store;

pub use config::Config;
pub use models::{DistributorView, IotReading, Payment, WaterPoint};
pub use state::{Snapshot, SnapshotStore};
