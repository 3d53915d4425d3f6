use std::fs::Permissions;
use std::io::{BufRead, BufReader, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::light_api::{LightState, LightType, Status};
use crate::service::{LightService, TransportError};

/// Sent by clients, one JSON object per line.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub enum Request {
    GetSupportedTypes,
    SetLight {
        light_type: LightType,
        state: LightState,
    },
}

/// Sent back by the service, exactly one per request.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub enum Response {
    SupportedTypes(Vec<LightType>),
    Status(Status),
    Error(String),
}

pub fn write_message<T: Serialize>(mut stream: &UnixStream, msg: &T) -> Result<(), TransportError> {
    let mut line = serde_json::to_vec(msg)?;
    line.push(b'\n');
    stream.write_all(&line)?;
    return Ok(());
}

/// Longest accepted message, newline included.
pub const MAX_MESSAGE_LEN: usize = 64 * 1024;

/// Reads one newline terminated message without the newline. Returns `None`
/// on a clean end of stream.
pub fn read_message(reader: &mut BufReader<UnixStream>) -> Result<Option<Vec<u8>>, TransportError> {
    let mut line = Vec::new();
    let n = reader
        .by_ref()
        .take(MAX_MESSAGE_LEN as u64)
        .read_until(b'\n', &mut line)?;
    if n == 0 {
        return Ok(None);
    }
    if line.last() != Some(&b'\n') {
        if n == MAX_MESSAGE_LEN {
            return Err(TransportError::Protocol(format!(
                "message longer than {} bytes",
                MAX_MESSAGE_LEN
            )));
        }
        return Err(TransportError::Disconnected);
    }
    line.pop();
    return Ok(Some(line));
}

fn dispatch<S: LightService>(service: &mut S, line: &[u8]) -> Response {
    let request: Request = match serde_json::from_slice(line) {
        Ok(request) => request,
        Err(e) => return Response::Error(format!("invalid request: {}", e)),
    };
    debug!(?request, "dispatching");
    let result = match request {
        Request::GetSupportedTypes => service.get_supported_types().map(Response::SupportedTypes),
        Request::SetLight { light_type, state } => {
            service.set_light(light_type, &state).map(Response::Status)
        }
    };
    return match result {
        Ok(response) => response,
        Err(e) => Response::Error(e.to_string()),
    };
}

/// Answers requests from one client until it hangs up.
pub fn handle_client<S: LightService>(stream: UnixStream, mut service: S) -> Result<(), TransportError> {
    let mut reader = BufReader::new(stream.try_clone()?);
    while let Some(line) = read_message(&mut reader)? {
        let response = dispatch(&mut service, &line);
        write_message(&stream, &response)?;
    }
    debug!("client hung up");
    return Ok(());
}

/// Binds the socket for a service, replacing a stale one from a previous run.
pub fn listen(socket: &Path) -> anyhow::Result<UnixListener> {
    // A daemon killed by a signal leaves its socket file behind.
    if socket.exists() {
        std::fs::remove_file(socket)?;
    }
    let listener = UnixListener::bind(socket)?;
    std::fs::set_permissions(socket, Permissions::from_mode(0o666))?;
    info!("listening on {}", socket.display());
    return Ok(listener);
}

/// Accept loop, every client gets its own thread and its own clone of `service`.
pub fn run<S>(listener: UnixListener, service: S)
where
    S: LightService + Clone + Send + 'static,
{
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                debug!("new client");
                let client_service = service.clone();
                thread::spawn(move || {
                    if let Err(e) = handle_client(stream, client_service) {
                        warn!("client connection failed: {}", e);
                    }
                });
            }
            Err(err) => {
                warn!("couldn't accept client: {}", err);
                continue;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light_api::{OFF, WHITE};

    #[test]
    fn request_wire_format() {
        let json = serde_json::to_string(&Request::GetSupportedTypes).unwrap();
        assert_eq!(json, "\"GetSupportedTypes\"");

        let json = serde_json::to_string(&Request::SetLight {
            light_type: LightType::Wifi,
            state: OFF,
        })
        .unwrap();
        assert!(json.starts_with("{\"SetLight\":{\"light_type\":\"WIFI\""));
        assert!(json.contains("\"flash_mode\":\"NONE\""));
    }

    #[test]
    fn response_parses_status() {
        let response: Response = serde_json::from_str("{\"Status\":\"LIGHT_NOT_SUPPORTED\"}").unwrap();
        assert_eq!(response, Response::Status(Status::LightNotSupported));
    }

    struct Fixed;

    impl LightService for Fixed {
        fn is_remote(&self) -> bool {
            false
        }

        fn get_supported_types(&mut self) -> Result<Vec<LightType>, TransportError> {
            Ok(vec![LightType::Battery])
        }

        fn set_light(&mut self, light_type: LightType, state: &LightState) -> Result<Status, TransportError> {
            if light_type != LightType::Battery {
                return Ok(Status::LightNotSupported);
            }
            if *state == WHITE {
                return Ok(Status::Success);
            }
            Err(TransportError::Poisoned)
        }
    }

    #[test]
    fn dispatch_maps_requests_and_errors() {
        let mut service = Fixed;
        assert_eq!(
            dispatch(&mut service, b"\"GetSupportedTypes\""),
            Response::SupportedTypes(vec![LightType::Battery])
        );

        let request = serde_json::to_string(&Request::SetLight {
            light_type: LightType::Keyboard,
            state: WHITE,
        })
        .unwrap();
        assert_eq!(dispatch(&mut service, request.as_bytes()), Response::Status(Status::LightNotSupported));

        let request = serde_json::to_string(&Request::SetLight {
            light_type: LightType::Battery,
            state: OFF,
        })
        .unwrap();
        assert!(matches!(dispatch(&mut service, request.as_bytes()), Response::Error(_)));

        assert!(matches!(dispatch(&mut service, b"{not json"), Response::Error(_)));
    }

    #[test]
    fn invalid_utf8_gets_an_error_reply() {
        let (client, server) = UnixStream::pair().unwrap();
        let worker = thread::spawn(move || handle_client(server, Fixed));

        let mut writer = &client;
        writer.write_all(b"\xff\xfe\n\"GetSupportedTypes\"\n").unwrap();
        let mut reader = BufReader::new(client.try_clone().unwrap());
        let reply = read_message(&mut reader).unwrap().unwrap();
        let reply: Response = serde_json::from_slice(&reply).unwrap();
        assert!(matches!(reply, Response::Error(msg) if msg.starts_with("invalid request")));

        // The connection survives the bad line.
        let reply = read_message(&mut reader).unwrap().unwrap();
        let reply: Response = serde_json::from_slice(&reply).unwrap();
        assert_eq!(reply, Response::SupportedTypes(vec![LightType::Battery]));

        drop(reader);
        drop(client);
        assert!(worker.join().unwrap().is_ok());
    }

    #[test]
    fn oversized_message_is_refused() {
        let (client, server) = UnixStream::pair().unwrap();
        let writer = thread::spawn(move || {
            let mut stream = &client;
            let _ = stream.write_all(&vec![b'a'; MAX_MESSAGE_LEN + 16]);
        });
        let mut reader = BufReader::new(server);
        let err = read_message(&mut reader).err().unwrap();
        assert!(matches!(err, TransportError::Protocol(msg) if msg.contains("longer than")));
        writer.join().unwrap();
    }

    #[test]
    fn truncated_message_is_a_disconnect() {
        let (client, server) = UnixStream::pair().unwrap();
        let mut stream = &client;
        stream.write_all(b"\"GetSupp").unwrap();
        drop(client);
        let mut reader = BufReader::new(server);
        assert!(matches!(read_message(&mut reader), Err(TransportError::Disconnected)));
    }
}
