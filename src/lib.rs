// High-level overview:
//
// Protocol:                   set_light/get_supported_types        json lines over domain socket
// Library Concept:   harness <-----------------------------> service <--------------------------> light daemon
//
// Implementing Binary:  light-vts / light-shell          client::RemoteLight                      lightd-dummy (dummy)

pub mod args;
pub mod client;
pub mod daemon;
pub mod dummy;
pub mod harness;
pub mod light_api;
pub mod service;

pub use light_api::*;
pub use service::{LightService, ServiceLocator, TransportError, LIGHT_SERVICE_NAME};

use tracing_subscriber::EnvFilter;

/// Installs the log subscriber shared by all binaries. `RUST_LOG` overrides
/// the default of `info`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
