// Alternate outputs: CSV on the sample callback, JSON and Prometheus over
// HTTP from store snapshots.

pub mod csv;
pub mod http;
pub mod prometheus;
