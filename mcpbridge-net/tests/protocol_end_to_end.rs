//! End-to-end coverage of §8's protocol and concurrency properties,
//! exercised over a real `TcpListener` rather than `FrameReader` alone.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use mcpbridge_core::bridge::ThreadBridge;
use mcpbridge_core::scheduler::ImmediateScheduler;
use mcpbridge_core::state::LiveSet;
use mcpbridge_core::Dispatcher;
use mcpbridge_net::Server;

fn start_server() -> (Arc<Server>, std::net::SocketAddr) {
    let server = Arc::new(Server::bind("127.0.0.1", 0).expect("bind"));
    let addr = server.local_addr().expect("local_addr");
    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(ThreadBridge::new(Arc::new(ImmediateScheduler))),
        Arc::new(Mutex::new(LiveSet::new())),
    ));
    let serve_server = server.clone();
    thread::spawn(move || serve_server.serve(dispatcher));
    thread::sleep(Duration::from_millis(50));
    (server, addr)
}

fn read_json(stream: &mut TcpStream) -> serde_json::Value {
    let mut buf = [0u8; 8192];
    let n = stream.read(&mut buf).expect("read");
    serde_json::from_slice(&buf[..n]).expect("valid json")
}

#[test]
fn greeting_arrives_as_first_bytes() {
    let (server, addr) = start_server();
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let greeting = read_json(&mut stream);
    assert_eq!(greeting, serde_json::json!({"status":"connected","message":"AbletonMCP Ready"}));
    server.shutdown();
}

#[test]
fn split_send_matches_whole_send_response() {
    let (server, addr) = start_server();
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let _greeting = read_json(&mut stream);

    let request = br#"{"type":"get_session_info","params":{}}"#;
    stream.write_all(&request[..15]).unwrap();
    thread::sleep(Duration::from_millis(20));
    stream.write_all(&request[15..]).unwrap();

    let resp = read_json(&mut stream);
    assert_eq!(resp["status"], "success");
    assert!(resp["result"]["tempo"].as_f64().is_some());
    server.shutdown();
}

#[test]
fn concatenated_requests_each_get_their_own_response() {
    let (server, addr) = start_server();
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let _greeting = read_json(&mut stream);

    let both = br#"{"type":"stop_playback","params":{}}{"type":"start_playback","params":{}}"#;
    stream.write_all(both).unwrap();

    let first = read_json(&mut stream);
    assert_eq!(first["status"], "success");
    let second = read_json(&mut stream);
    assert_eq!(second["status"], "success");
    server.shutdown();
}

#[test]
fn unknown_command_yields_documented_error_and_connection_survives() {
    let (server, addr) = start_server();
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let _greeting = read_json(&mut stream);

    stream.write_all(br#"{"type":"nonexistent_command","params":{}}"#).unwrap();
    let resp = read_json(&mut stream);
    assert_eq!(resp["status"], "error");
    assert_eq!(resp["message"], "Unknown command: nonexistent_command");

    stream.write_all(br#"{"type":"get_session_info","params":{}}"#).unwrap();
    let resp = read_json(&mut stream);
    assert_eq!(resp["status"], "success");
    server.shutdown();
}

#[test]
fn malformed_frame_sends_one_error_response_then_closes() {
    let (server, addr) = start_server();
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let _greeting = read_json(&mut stream);

    stream.write_all(b"this is not json").unwrap();
    let resp = read_json(&mut stream);
    assert_eq!(resp["status"], "error");

    let mut buf = [0u8; 64];
    let n = stream.read(&mut buf).unwrap_or(0);
    assert_eq!(n, 0, "connection should close after the one error response (§4.7)");
    server.shutdown();
}

#[test]
fn concurrent_connections_each_get_exactly_their_own_responses() {
    let (server, addr) = start_server();

    let handles: Vec<_> = (0..5)
        .map(|i| {
            thread::spawn(move || {
                let mut stream = TcpStream::connect(addr).unwrap();
                stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
                let _greeting = read_json(&mut stream);

                for _ in 0..10 {
                    let req = format!(r#"{{"type":"set_tempo","params":{{"tempo":{}}}}}"#, 100 + i);
                    stream.write_all(req.as_bytes()).unwrap();
                    let resp = read_json(&mut stream);
                    assert_eq!(resp["status"], "success");
                    assert_eq!(resp["result"]["tempo"].as_f64().unwrap(), (100 + i) as f64);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    server.shutdown();
}
