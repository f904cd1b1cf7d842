//! End-to-end harness playing the DAW's part well enough to drive the
//! whole stack: binds through `HostBoundary::on_init`, drives the
//! main-thread tick loop the way a real host's scheduler callback
//! would, sends requests over a real TCP socket, and tears down
//! through `on_disconnect`. Mirrors §8's concrete end-to-end scenarios.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mcpbridge_host::HostBoundary;

fn read_json(stream: &mut TcpStream) -> serde_json::Value {
    let mut buf = [0u8; 8192];
    let n = stream.read(&mut buf).expect("read");
    serde_json::from_slice(&buf[..n]).expect("valid json")
}

/// Spawns a background thread that repeatedly drains the Thread
/// Bridge's queue, the way a real DAW's tick callback would — the
/// harness's stand-in for "the host calls us back on the main thread".
fn spawn_tick_loop(boundary: Arc<HostBoundary>, stop: Arc<AtomicBool>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        while !stop.load(Ordering::SeqCst) {
            boundary.run_pending_main_thread_work();
            std::thread::sleep(Duration::from_millis(5));
        }
    })
}

#[test]
fn greeting_session_info_and_shutdown_over_a_real_socket() {
    std::env::set_var("ABLETON_MCP_PORT", "0");
    let boundary = Arc::new(HostBoundary::new());
    boundary.on_init();
    let addr = boundary.bound_addr().expect("bound");

    let stop = Arc::new(AtomicBool::new(false));
    let ticker = spawn_tick_loop(boundary.clone(), stop.clone());

    let mut stream = TcpStream::connect(addr).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

    let greeting = read_json(&mut stream);
    assert_eq!(greeting["status"], "connected");
    assert_eq!(greeting["message"], "AbletonMCP Ready");

    stream
        .write_all(br#"{"type":"get_session_info","params":{}}"#)
        .unwrap();
    let resp = read_json(&mut stream);
    assert_eq!(resp["status"], "success");
    assert_eq!(resp["result"]["tempo"], 120.0);
    assert_eq!(resp["result"]["track_count"], 0);

    stream
        .write_all(br#"{"type":"nonexistent_command","params":{}}"#)
        .unwrap();
    let resp = read_json(&mut stream);
    assert_eq!(resp["status"], "error");
    assert_eq!(resp["message"], "Unknown command: nonexistent_command");

    // The connection survives an unknown command (§8 scenario 4).
    stream
        .write_all(br#"{"type":"get_session_info","params":{}}"#)
        .unwrap();
    let resp = read_json(&mut stream);
    assert_eq!(resp["status"], "success");

    stop.store(true, Ordering::SeqCst);
    ticker.join().unwrap();
    boundary.on_disconnect();
}

#[test]
fn create_track_write_chord_and_read_it_back() {
    std::env::set_var("ABLETON_MCP_PORT", "0");
    let boundary = Arc::new(HostBoundary::new());
    boundary.on_init();
    let addr = boundary.bound_addr().expect("bound");

    let stop = Arc::new(AtomicBool::new(false));
    let ticker = spawn_tick_loop(boundary.clone(), stop.clone());

    let mut stream = TcpStream::connect(addr).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let _greeting = read_json(&mut stream);

    stream
        .write_all(br#"{"type":"create_midi_track","params":{"index":-1}}"#)
        .unwrap();
    let resp = read_json(&mut stream);
    assert_eq!(resp["status"], "success");
    let track_index = resp["result"]["index"].as_i64().unwrap();

    let create_clip = serde_json::json!({
        "type": "create_clip",
        "params": {"track_index": track_index, "clip_index": 0, "length": 4.0}
    });
    stream.write_all(create_clip.to_string().as_bytes()).unwrap();
    let resp = read_json(&mut stream);
    assert_eq!(resp["status"], "success");

    let add_notes = serde_json::json!({
        "type": "add_notes_to_clip",
        "params": {
            "track_index": track_index,
            "clip_index": 0,
            "notes": [
                {"pitch": 60, "start_time": 0.0, "duration": 1.0, "velocity": 100},
                {"pitch": 64, "start_time": 0.0, "duration": 1.0, "velocity": 100},
                {"pitch": 67, "start_time": 0.0, "duration": 1.0, "velocity": 100}
            ]
        }
    });
    stream.write_all(add_notes.to_string().as_bytes()).unwrap();
    let resp = read_json(&mut stream);
    assert_eq!(resp["status"], "success");
    assert_eq!(resp["result"]["note_count"], 3);

    let get_track = serde_json::json!({
        "type": "get_track_info",
        "params": {"track_index": track_index}
    });
    stream.write_all(get_track.to_string().as_bytes()).unwrap();
    let resp = read_json(&mut stream);
    assert_eq!(resp["status"], "success");
    assert_eq!(resp["result"]["clip_slots"][0]["has_clip"], true);
    assert_eq!(resp["result"]["clip_slots"][0]["clip"]["length"], 4.0);

    stop.store(true, Ordering::SeqCst);
    ticker.join().unwrap();
    boundary.on_disconnect();
}

#[test]
fn stalled_main_thread_yields_a_timeout_not_a_hang() {
    // This harness's own tick loop simply never starts, so every
    // mutating request times out the way a wedged main thread would
    // (§8 scenario 5) -- without waiting out the full 10s budget,
    // the dispatcher's timeout still bounds the response.
    std::env::set_var("ABLETON_MCP_PORT", "0");
    let boundary = Arc::new(HostBoundary::new());
    boundary.on_init();
    let addr = boundary.bound_addr().expect("bound");

    let mut stream = TcpStream::connect(addr).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(12))).unwrap();
    let _greeting = read_json(&mut stream);

    stream
        .write_all(br#"{"type":"create_midi_track","params":{"index":-1}}"#)
        .unwrap();
    let resp = read_json(&mut stream);
    assert_eq!(resp["status"], "error");
    assert_eq!(resp["message"], "Timeout waiting for operation to complete");

    boundary.on_disconnect();
}
