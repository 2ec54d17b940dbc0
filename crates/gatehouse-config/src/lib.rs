//! Layered TOML configuration for the Gatehouse gateway.
//!
//! Everything a deployment tunes lives here: the listen address, the
//! truncation threshold, confirmation TTLs, the resolution policy, and the
//! tool catalog itself with its role requirements and parameter schemas.
//!
//! Loading is layered: embedded defaults first, then an optional config file
//! on top. The merged result is validated before the gateway starts; a
//! catalog nobody can ever satisfy is a deployment mistake, not something to
//! discover one denied call at a time.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod loader;
pub mod types;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load, load_default, load_str};
pub use types::{
    GatewayConfig, LimitsSection, ParamConfig, ResolutionPolicy, ResolutionSection, ScopeKind,
    ServerSection, ToolConfig,
};
pub use validate::validate;
