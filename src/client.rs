use std::io::BufReader;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, trace};

use crate::daemon::{self, Request, Response};
use crate::light_api::{LightState, LightType, Status};
use crate::service::{LightService, ServiceLocator, TransportError};

/// Handle to a light service running in another process.
pub struct RemoteLight {
    stream: UnixStream,
    reader: BufReader<UnixStream>,
}

impl RemoteLight {
    pub fn connect(socket: &Path, timeout: Option<Duration>) -> Result<RemoteLight, TransportError> {
        let stream = UnixStream::connect(socket)?;
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;
        let reader = BufReader::new(stream.try_clone()?);
        debug!("connected to {}", socket.display());
        return Ok(RemoteLight { stream, reader });
    }

    fn call(&mut self, request: &Request) -> Result<Response, TransportError> {
        trace!(?request, "sending");
        daemon::write_message(&self.stream, request)?;
        let line = match daemon::read_message(&mut self.reader)? {
            Some(line) => line,
            None => return Err(TransportError::Disconnected),
        };
        let response: Response = serde_json::from_slice(&line)?;
        trace!(?response, "received");
        return match response {
            Response::Error(msg) => Err(TransportError::Rejected(msg)),
            response => Ok(response),
        };
    }
}

impl LightService for RemoteLight {
    fn is_remote(&self) -> bool {
        return true;
    }

    fn get_supported_types(&mut self) -> Result<Vec<LightType>, TransportError> {
        return match self.call(&Request::GetSupportedTypes)? {
            Response::SupportedTypes(types) => Ok(types),
            other => Err(TransportError::Protocol(format!("unexpected reply {:?}", other))),
        };
    }

    fn set_light(&mut self, light_type: LightType, state: &LightState) -> Result<Status, TransportError> {
        let request = Request::SetLight {
            light_type,
            state: *state,
        };
        return match self.call(&request)? {
            Response::Status(status) => Ok(status),
            other => Err(TransportError::Protocol(format!("unexpected reply {:?}", other))),
        };
    }
}

/// Finds services as `<socket_dir>/<name>.sock`.
#[derive(Clone, Debug)]
pub struct SocketLocator {
    pub socket_dir: PathBuf,
    pub timeout: Option<Duration>,
}

impl SocketLocator {
    pub fn new(socket_dir: impl Into<PathBuf>) -> SocketLocator {
        return SocketLocator {
            socket_dir: socket_dir.into(),
            timeout: None,
        };
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> SocketLocator {
        self.timeout = timeout;
        return self;
    }

    pub fn socket_path(&self, name: &str) -> PathBuf {
        return self.socket_dir.join(format!("{}.sock", name));
    }
}

impl ServiceLocator for SocketLocator {
    type Service = RemoteLight;

    fn get_service(&self, name: &str) -> Result<RemoteLight, TransportError> {
        let path = self.socket_path(name);
        if !path.exists() {
            return Err(TransportError::ServiceNotFound(name.to_string()));
        }
        return RemoteLight::connect(&path, self.timeout).map_err(|e| match e {
            TransportError::Io(io) if io.kind() == std::io::ErrorKind::ConnectionRefused => {
                TransportError::ServiceNotFound(name.to_string())
            }
            e => e,
        });
    }
}
