//! Configuration structures for packaging runs.
//!
//! [`Settings`] carries every input of a run explicitly: paths, the values
//! written into the configuration document, the staging layout, publish
//! intent and catalog credentials. It is built with [`SettingsBuilder`].

mod arch;
mod builder;
mod channel;
mod core;
mod credentials;
mod layout;

pub use arch::Arch;
pub use builder::{DEFAULT_DISPLAY_NAME_FILTER, DEFAULT_TOOL_TIMEOUT, SettingsBuilder};
pub use channel::Channel;
pub use core::{MANIFEST_FILE_NAME, PublishIntent, Settings};
pub use credentials::{ClientCredentials, SupersedenceKind};
pub use layout::{Layout, SupportFiles};
