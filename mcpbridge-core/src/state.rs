//! The live object graph (§3, §4.4).
//!
//! `LiveSet` stands in for the DAW's song object: a concrete, owned
//! struct tree mutated only through the façade methods in
//! [`crate::facade`]. There is no real DAW binding behind this in a
//! standalone build — see `DESIGN.md`'s Open Question #1 — so every
//! field here is plain owned state, the same way the reference
//! workspace's `AppState` holds the whole application model as owned
//! structs rather than trait objects.

use mcpbridge_types::{Note, TrackKind};

#[derive(Debug, Clone)]
pub struct MasterTrack {
    pub volume: f64,
    pub panning: f64,
}

impl Default for MasterTrack {
    fn default() -> Self {
        Self {
            volume: 0.85,
            panning: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Send {
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for Send {
    fn default() -> Self {
        Self {
            value: 0.0,
            min: 0.0,
            max: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Clip {
    pub name: String,
    pub length: f64,
    pub looping: bool,
    pub loop_start: f64,
    pub loop_end: f64,
    pub is_midi_clip: bool,
    pub notes: Vec<Note>,
    pub is_playing: bool,
    pub is_recording: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ClipSlot {
    pub clip: Option<Clip>,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub value: f64,
    pub is_quantized: bool,
    pub value_items: Option<Vec<String>>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Instrument,
    AudioEffect,
    MidiEffect,
    Rack,
    DrumMachine,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct Device {
    pub name: String,
    pub class_name: String,
    pub kind: DeviceKind,
    pub parameters: Vec<Parameter>,
    /// Whether this device exposes a sidechain audio input at all
    /// (capability probe stand-in for the reference's `hasattr` checks, §9).
    pub supports_sidechain: bool,
    /// Per-device input routing option lists, when the host exposes them.
    pub input_routing_types: Option<Vec<String>>,
    pub input_routing_channels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Monitor {
    In,
    Auto,
    Off,
}

#[derive(Debug, Clone)]
pub struct Routing {
    pub input_type: Option<String>,
    pub input_channel: Option<String>,
    pub output_type: Option<String>,
    pub output_channel: Option<String>,
    pub monitor: Monitor,
    pub available_input_types: Vec<String>,
    pub available_input_channels: Vec<String>,
    pub available_output_types: Vec<String>,
    pub available_output_channels: Vec<String>,
}

impl Default for Routing {
    fn default() -> Self {
        Self {
            input_type: Some("Ext. In".to_string()),
            input_channel: Some("1/2".to_string()),
            output_type: Some("Master".to_string()),
            output_channel: Some("Main".to_string()),
            monitor: Monitor::Auto,
            available_input_types: vec!["Ext. In".to_string(), "Resampling".to_string()],
            available_input_channels: vec!["1/2".to_string(), "3/4".to_string()],
            available_output_types: vec!["Master".to_string()],
            available_output_channels: vec!["Main".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    pub name: String,
    pub kind: TrackKind,
    pub mute: bool,
    pub solo: bool,
    pub arm: bool,
    pub volume: f64,
    pub panning: f64,
    pub sends: Vec<Send>,
    pub clip_slots: Vec<ClipSlot>,
    pub devices: Vec<Device>,
    pub routing: Routing,
}

impl Track {
    fn new(name: impl Into<String>, kind: TrackKind, scene_count: usize, return_count: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            mute: false,
            solo: false,
            arm: false,
            volume: 0.85,
            panning: 0.0,
            sends: (0..return_count).map(|_| Send::default()).collect(),
            clip_slots: (0..scene_count).map(|_| ClipSlot::default()).collect(),
            devices: Vec::new(),
            routing: Routing::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReturnTrack {
    pub name: String,
    pub volume: f64,
    pub panning: f64,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
}

/// A node in the static browser tree (§4.4, §4.9). Real browser URIs
/// are opaque and host-assigned; here they're synthesized from the
/// path so lookups stay deterministic within a process lifetime.
#[derive(Debug, Clone)]
pub struct BrowserNode {
    pub name: String,
    pub uri: String,
    pub is_folder: bool,
    pub is_device: bool,
    pub is_loadable: bool,
    pub children: Vec<BrowserNode>,
}

impl BrowserNode {
    fn folder(name: &str, children: Vec<BrowserNode>) -> Self {
        Self {
            name: name.to_string(),
            uri: format!("query:{}", name.to_lowercase()),
            is_folder: true,
            is_device: false,
            is_loadable: false,
            children,
        }
    }

    fn device(name: &str, uri: &str) -> Self {
        Self {
            name: name.to_string(),
            uri: uri.to_string(),
            is_folder: false,
            is_device: true,
            is_loadable: true,
            children: Vec::new(),
        }
    }

    fn default_root() -> Self {
        BrowserNode::folder(
            "root",
            vec![
                BrowserNode::folder(
                    "instruments",
                    vec![
                        BrowserNode::device("Simpler", "device:instrument:simpler"),
                        BrowserNode::device("Sampler", "device:instrument:sampler"),
                        BrowserNode::device("Wavetable", "device:instrument:wavetable"),
                    ],
                ),
                BrowserNode::folder("sounds", vec![]),
                BrowserNode::folder("drums", vec![]),
                BrowserNode::folder(
                    "audio_effects",
                    vec![BrowserNode::device("Compressor", "device:audio_effect:compressor")],
                ),
                BrowserNode::folder("midi_effects", vec![]),
                BrowserNode::folder("samples", vec![]),
            ],
        )
    }
}

/// The bridge's stand-in for the DAW's `Song` object. Owned by the
/// Host Boundary and mutated exclusively on the main thread.
pub struct LiveSet {
    pub tempo: f64,
    pub signature_numerator: u32,
    pub signature_denominator: u32,
    pub is_playing: bool,
    pub record_mode: bool,
    pub session_record: bool,
    pub arrangement_overdub: bool,
    pub master: MasterTrack,
    pub tracks: Vec<Track>,
    pub return_tracks: Vec<ReturnTrack>,
    pub scenes: Vec<Scene>,
    pub browser: BrowserNode,
    /// The last scene fired, if any — the reference's "selected scene"
    /// follows playback focus the same way; `stop_scene` only escalates
    /// to a global stop when the row it's stopping is this one (§4.5).
    pub selected_scene: Option<usize>,
    /// Whether this façade round-trips the extended note fields
    /// (`probability`, `velocity_deviation`, `release_velocity`,
    /// `note_id`) — the capability this façade always has, standing in
    /// for the reference's `hasattr(clip, "set_notes_extended")` probe (§9).
    pub supports_extended_notes: bool,
    next_note_id: i64,
}

impl LiveSet {
    pub fn new() -> Self {
        let return_tracks = vec![
            ReturnTrack {
                name: "A Reverb".to_string(),
                volume: 0.85,
                panning: 0.0,
            },
            ReturnTrack {
                name: "B Delay".to_string(),
                volume: 0.85,
                panning: 0.0,
            },
        ];
        let scenes = (1..=8).map(|_| Scene { name: String::new() }).collect();

        Self {
            tempo: 120.0,
            signature_numerator: 4,
            signature_denominator: 4,
            is_playing: false,
            record_mode: false,
            session_record: false,
            arrangement_overdub: false,
            master: MasterTrack::default(),
            tracks: Vec::new(),
            return_tracks,
            scenes,
            browser: BrowserNode::default_root(),
            selected_scene: None,
            supports_extended_notes: true,
            next_note_id: 1,
        }
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn return_count(&self) -> usize {
        self.return_tracks.len()
    }

    pub(crate) fn allocate_note_id(&mut self) -> i64 {
        let id = self.next_note_id;
        self.next_note_id += 1;
        id
    }

    fn new_track(&self, name: impl Into<String>, kind: TrackKind) -> Track {
        Track::new(name, kind, self.scene_count(), self.return_count())
    }

    pub(crate) fn push_track(&mut self, index: i64, kind: TrackKind, prefix: &str) -> usize {
        let track = self.new_track(format!("{} {}", prefix, self.tracks.len() + 1), kind);
        let insert_at = if index < 0 || index as usize >= self.tracks.len() {
            self.tracks.len()
        } else {
            index as usize
        };
        self.tracks.insert(insert_at, track);
        insert_at
    }
}

impl Default for LiveSet {
    fn default() -> Self {
        Self::new()
    }
}
