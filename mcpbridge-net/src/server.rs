//! TCP Server & Connection Pool (§4.8): owns the listening socket,
//! accepts connections on a polling loop that stands in for "accept
//! with a 1-second timeout", and spawns one worker thread per
//! connection.

use std::io;
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mcpbridge_core::scheduler::MainThreadScheduler;
use mcpbridge_core::Dispatcher;

use crate::worker::run_connection;

/// How long an accept-loop iteration waits before checking the
/// shutdown flag again. `TcpListener` has no blocking-with-timeout
/// accept, so a non-blocking listener polled at this interval is the
/// nearest equivalent.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Upper bound on how long `Server::shutdown` waits for worker threads
/// to notice the connection close and exit before giving up on them.
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(2);
const SHUTDOWN_JOIN_POLL_INTERVAL: Duration = Duration::from_millis(20);

pub struct Server {
    listener: TcpListener,
    running: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Server {
    /// Binds the listening socket. Does not start accepting; call
    /// [`Server::serve`] (typically on its own thread) to run the
    /// accept loop.
    pub fn bind(host: &str, port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind((host, port))?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            running: Arc::new(AtomicBool::new(true)),
            workers: Mutex::new(Vec::new()),
        })
    }

    pub fn local_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until [`Server::shutdown`] is called from
    /// another thread. Every accepted connection gets its own worker
    /// thread sharing the same `Dispatcher`.
    pub fn serve<S: MainThreadScheduler + 'static>(&self, dispatcher: Arc<Dispatcher<S>>) {
        while self.running.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, _addr)) => {
                    let dispatcher = dispatcher.clone();
                    let handle = thread::spawn(move || run_connection(stream, dispatcher));
                    self.prune_and_push(handle);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    log::warn!("accept error: {e}");
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }
    }

    fn prune_and_push(&self, handle: JoinHandle<()>) {
        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        workers.retain(|h| !h.is_finished());
        workers.push(handle);
    }

    /// Idempotent. Flips the running flag so the accept loop exits on
    /// its next wakeup, then makes a bounded, best-effort attempt to
    /// join outstanding workers. Workers that don't finish in time are
    /// left to exit on their own; sockets close with the process.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);

        let deadline = std::time::Instant::now() + SHUTDOWN_JOIN_TIMEOUT;
        loop {
            let all_finished = {
                let workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
                workers.iter().all(|h| h.is_finished())
            };
            if all_finished || std::time::Instant::now() >= deadline {
                break;
            }
            thread::sleep(SHUTDOWN_JOIN_POLL_INTERVAL);
        }

        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        for handle in workers.drain(..) {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcpbridge_core::bridge::ThreadBridge;
    use mcpbridge_core::scheduler::ImmediateScheduler;
    use mcpbridge_core::state::LiveSet;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    fn spawn_test_server() -> (Arc<Server>, std::net::SocketAddr) {
        let server = Arc::new(Server::bind("127.0.0.1", 0).unwrap());
        let addr = server.local_addr().unwrap();
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::new(ThreadBridge::new(Arc::new(ImmediateScheduler))),
            Arc::new(Mutex::new(LiveSet::new())),
        ));
        let serve_server = server.clone();
        thread::spawn(move || serve_server.serve(dispatcher));
        thread::sleep(Duration::from_millis(50));
        (server, addr)
    }

    #[test]
    fn accepts_a_connection_and_sends_greeting() {
        let (server, addr) = spawn_test_server();
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(1))).unwrap();

        let mut buf = [0u8; 256];
        let n = stream.read(&mut buf).unwrap();
        let greeting: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(greeting["status"], "connected");
        assert_eq!(greeting["message"], "AbletonMCP Ready");

        server.shutdown();
    }

    #[test]
    fn serves_a_request_after_the_greeting() {
        let (server, addr) = spawn_test_server();
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(1))).unwrap();

        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf).unwrap();

        stream.write_all(br#"{"type":"get_session_info","params":{}}"#).unwrap();
        let n = stream.read(&mut buf).unwrap();
        let resp: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(resp["status"], "success");

        server.shutdown();
    }

    #[test]
    fn shutdown_stops_the_accept_loop() {
        let (server, _addr) = spawn_test_server();
        assert!(server.is_running());
        server.shutdown();
        assert!(!server.is_running());
    }
}
