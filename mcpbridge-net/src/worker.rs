//! Per-connection I/O worker (§4.8): one OS thread per accepted socket,
//! reading frames, dispatching them, and writing back responses until
//! the peer disconnects or sends something fatal.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use mcpbridge_core::scheduler::MainThreadScheduler;
use mcpbridge_core::Dispatcher;
use mcpbridge_types::Response;

use crate::error::ProtocolError;
use crate::protocol::{FrameReader, READ_CHUNK_BYTES};

/// Drives one accepted connection to completion. Never panics on a
/// peer's behalf: I/O errors and protocol errors both just end the
/// loop, dropping the socket.
pub fn run_connection<S: MainThreadScheduler + 'static>(
    mut stream: TcpStream,
    dispatcher: Arc<Dispatcher<S>>,
) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());
    log::info!("connection opened: {peer}");

    if let Err(e) = write_response(&mut stream, &Response::connected()) {
        log::warn!("{peer}: failed to send greeting: {e}");
        return;
    }

    let mut frames = FrameReader::new();
    let mut chunk = [0u8; READ_CHUNK_BYTES];

    loop {
        match frames.try_take_frame() {
            Ok(Some(request)) => {
                let response = dispatcher.dispatch(&request);
                if let Err(e) = write_response(&mut stream, &response) {
                    log::warn!("{peer}: failed to write response: {e}");
                    break;
                }
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("{peer}: {e}, closing connection");
                let _ = write_response(&mut stream, &Response::error(e.to_string()));
                break;
            }
        }

        let n = match stream.read(&mut chunk) {
            Ok(0) => {
                log::info!("{peer}: peer closed connection");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                log::warn!("{peer}: read error: {e}");
                break;
            }
        };

        if let Err(e) = frames.feed(&chunk[..n]) {
            log::warn!("{peer}: {e}, closing connection");
            let _ = write_response(&mut stream, &Response::error(e.to_string()));
            break;
        }
    }

    log::info!("connection closed: {peer}");
}

fn write_response(stream: &mut TcpStream, response: &Response) -> Result<(), ProtocolError> {
    let bytes = serde_json::to_vec(response).expect("Response always serializes");
    stream.write_all(&bytes)?;
    stream.flush()?;
    Ok(())
}
