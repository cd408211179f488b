//! Remote package catalog.
//!
//! The pipeline talks to the device-management service only through
//! [`CatalogClient`]. [`GraphCatalogClient`] is the production implementation;
//! records belonging to one logical package are correlated through a
//! [`TrackingToken`] in their notes.

mod contract;
pub mod graph;
mod token;

pub use contract::{CatalogClient, PublishedPackageRecord};
pub use graph::{GraphCatalogClient, GraphOptions};
pub use token::{notes_track, TrackingToken};

#[cfg(test)]
pub use contract::MockCatalogClient;
