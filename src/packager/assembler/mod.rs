//! Package assembly.
//!
//! Stages the installer, configuration and support files, runs the
//! packaging tool, and locates the resulting archive.

mod artifact;
mod staging;
mod tool;
mod tool_detection;

pub use artifact::{calculate_sha256, locate, PackageArtifact, ARCHIVE_EXTENSION};
pub use staging::{assemble, check_inputs, AssembleRequest, StagedPackage};
pub use tool::{CommandPackagingTool, PackagingRequest, PackagingTool};
pub use tool_detection::{resolve_tool, PACKAGING_TOOL_ON_PATH, TOOL_NAMES};

#[cfg(test)]
pub use tool::MockPackagingTool;
