//! hostlink: a command bridge to a live content-authoring editor host.
//!
//! Commands travel over one lazily opened TCP session as length-prefixed
//! JSON envelopes. Every command, host-side or local, returns the same
//! `CommandResult` mapping.

pub mod bridge;
pub mod commands;
pub mod config;
pub mod contract;
pub mod http;
pub mod image_gen;
pub mod knowledge;
pub mod logging;
pub mod result;
pub mod subresource;
pub mod templates;
pub mod toolkit;
pub mod version;

pub use bridge::{CommandEnvelope, Session, SessionError};
pub use commands::HostCommand;
pub use config::Config;
pub use contract::{Bridge, PostSuccessHook, RationaleHook};
pub use result::CommandResult;
pub use subresource::{GeneratorIndex, KeyName, NodeId, TestIndex};
pub use toolkit::{ToolInfo, Toolkit};
pub use version::{HOSTLINK_VERSION, VersionInfo};
