use thiserror::Error;

use crate::light_api::{LightState, LightType, Status};

/// Well-known name the light service registers under.
pub const LIGHT_SERVICE_NAME: &str = "light";

/// A call that did not complete at the contract level. Conformance runs
/// treat any of these as fatal for the current case.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no service registered as '{0}'")]
    ServiceNotFound(String),

    #[error("service closed the connection")]
    Disconnected,

    #[error("malformed message: {0}")]
    Protocol(String),

    #[error("service rejected the request: {0}")]
    Rejected(String),

    #[error("service state is poisoned")]
    Poisoned,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> TransportError {
        return TransportError::Protocol(e.to_string());
    }
}

/// The request side of a light-control service.
pub trait LightService {
    /// Whether calls leave the current process.
    fn is_remote(&self) -> bool;

    fn get_supported_types(&mut self) -> Result<Vec<LightType>, TransportError>;

    fn set_light(
        &mut self,
        light_type: LightType,
        state: &LightState,
    ) -> Result<Status, TransportError>;
}

/// Resolves a well-known service name to a live handle.
pub trait ServiceLocator {
    type Service: LightService;

    fn get_service(&self, name: &str) -> Result<Self::Service, TransportError>;
}

impl<F, S> ServiceLocator for F
where
    F: Fn(&str) -> Result<S, TransportError>,
    S: LightService,
{
    type Service = S;

    fn get_service(&self, name: &str) -> Result<S, TransportError> {
        return self(name);
    }
}
