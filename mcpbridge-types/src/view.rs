//! Read-projection DTOs returned to callers (§3).
//!
//! These are serialization-only views; the live, mutable object graph
//! lives in `mcpbridge-core`'s façade and is re-read from the DAW on
//! every call. Nothing here is cached across requests.

use serde::{Deserialize, Serialize};

/// `audio` / `midi` / `return` / `master` / `group`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Midi,
    Return,
    Master,
    Group,
}

/// Derived device category shown alongside its host `class_name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Instrument,
    AudioEffect,
    MidiEffect,
    Rack,
    DrumMachine,
    Unknown,
}

/// Input monitoring state; `Passthrough` covers host enum values this
/// façade doesn't recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    In,
    Auto,
    Off,
    Passthrough(i64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterTrackView {
    pub name: String,
    pub volume: f64,
    pub panning: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub tempo: f64,
    pub signature_numerator: u32,
    pub signature_denominator: u32,
    pub is_playing: bool,
    pub track_count: usize,
    pub return_track_count: usize,
    pub scene_count: usize,
    pub master_track: MasterTrackView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendView {
    pub index: usize,
    pub return_track_name: Option<String>,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipSummary {
    pub name: String,
    pub length: f64,
    pub is_playing: bool,
    pub is_recording: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipSlotView {
    pub has_clip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<ClipSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub index: usize,
    pub name: String,
    pub class_name: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingView {
    pub input_type: Option<String>,
    pub input_channel: Option<String>,
    pub output_type: Option<String>,
    pub output_channel: Option<String>,
    pub monitor: MonitorState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackView {
    pub index: usize,
    pub name: String,
    pub kind: TrackKind,
    pub mute: bool,
    pub solo: bool,
    pub arm: bool,
    pub volume: f64,
    pub panning: f64,
    pub sends: Vec<SendView>,
    pub clip_slots: Vec<ClipSlotView>,
    pub devices: Vec<DeviceSummary>,
    pub routing: RoutingView,
}

/// A single MIDI note. Extended fields round-trip only when the host
/// exposes its extended-note API (§4.4, §9 capability-probe note).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub pitch: u8,
    pub start_time: f64,
    pub duration: f64,
    pub velocity: u8,
    #[serde(default)]
    pub mute: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_deviation: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_velocity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipView {
    pub track_index: usize,
    pub clip_index: usize,
    pub name: String,
    pub length: f64,
    pub looping: bool,
    pub loop_start: f64,
    pub loop_end: f64,
    pub is_midi_clip: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterView {
    pub index: usize,
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub value: f64,
    pub is_quantized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserNodeView {
    pub name: String,
    pub uri: String,
    pub is_folder: bool,
    pub is_device: bool,
    pub is_loadable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BrowserNodeView>,
}

/// One entry in a persisted browser cache file (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserCacheEntry {
    pub name: String,
    pub category: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// On-disk shape of a single browser cache file: `{count, items}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserCacheFile {
    pub count: usize,
    pub items: Vec<BrowserCacheEntry>,
}
