//! Packaging and publishing toolkit for Microsoft 365 Apps deployments.
//!
//! This library builds `.intunewin` packages from an Office Deployment Tool
//! configuration and publishes them to Microsoft Intune:
//! - edits a copy of the configuration (channel, tenant, organization)
//! - stages the installer and support files and runs the packaging tool
//! - writes a manifest with detection rules
//! - publishes when newer than the catalog and supersedes older versions
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod packager;

// Re-export commonly used types
pub use error::{CliError, PackagerError, Result};
