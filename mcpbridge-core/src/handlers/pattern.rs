//! Pattern-generation helpers (§4.5): deterministic note emission for
//! a couple of common starting points, so a caller doesn't have to
//! spell out every note of a basic beat or chord by hand.
//!
//! The reference tool's exact grids live outside this retrieval pack
//! (`mcp_tooling.drummer`); the grids below are a from-scratch but
//! deterministic rendering of the same two named styles, using
//! General MIDI drum pitches. See `DESIGN.md`.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::FacadeError;
use crate::facade::clamp_note;
use crate::params::{f64_param, i64_param, required_i64, required_str};
use crate::state::{Clip, LiveSet};
use mcpbridge_types::Note;

const KICK: u8 = 36;
const SNARE: u8 = 38;
const CLOSED_HAT: u8 = 42;

fn note(pitch: u8, start_time: f64, duration: f64, velocity: u8) -> Note {
    let mut n = Note {
        pitch,
        start_time,
        duration,
        velocity,
        mute: false,
        probability: None,
        velocity_deviation: None,
        release_velocity: None,
        note_id: None,
    };
    clamp_note(&mut n);
    n
}

fn four_on_floor_notes(length: f64, velocity: u8) -> Vec<Note> {
    let mut notes = Vec::new();
    let bars = (length / 4.0).ceil().max(1.0) as i64;
    for bar in 0..bars {
        let base = bar as f64 * 4.0;
        for beat in 0..4 {
            notes.push(note(KICK, base + beat as f64, 0.25, velocity));
        }
        notes.push(note(SNARE, base + 1.0, 0.25, velocity));
        notes.push(note(SNARE, base + 3.0, 0.25, velocity));
        let mut eighth = 0.0;
        while eighth < 4.0 {
            notes.push(note(CLOSED_HAT, base + eighth, 0.125, velocity.saturating_sub(20)));
            eighth += 0.5;
        }
    }
    notes.retain(|n| n.start_time < length);
    notes
}

fn trap_notes(length: f64, velocity: u8) -> Vec<Note> {
    let mut notes = Vec::new();
    let bars = (length / 4.0).ceil().max(1.0) as i64;
    for bar in 0..bars {
        let base = bar as f64 * 4.0;
        notes.push(note(KICK, base + 0.0, 0.2, velocity));
        notes.push(note(KICK, base + 1.75, 0.2, velocity));
        notes.push(note(KICK, base + 2.5, 0.2, velocity));
        notes.push(note(SNARE, base + 1.0, 0.2, velocity));
        notes.push(note(SNARE, base + 3.0, 0.2, velocity));
        let mut sixteenth = 0.0;
        while sixteenth < 4.0 {
            notes.push(note(CLOSED_HAT, base + sixteenth, 0.0625, velocity.saturating_sub(30)));
            sixteenth += 0.25;
        }
    }
    notes.retain(|n| n.start_time < length);
    notes
}

fn chord_intervals(quality: &str) -> &'static [i64] {
    match quality {
        "minor" => &[0, 3, 7],
        "sus2" => &[0, 2, 7],
        "sus4" => &[0, 5, 7],
        "7" => &[0, 4, 7, 10],
        "maj7" => &[0, 4, 7, 11],
        "min7" => &[0, 3, 7, 10],
        _ => &[0, 4, 7], // major, and the fallback for unknown qualities
    }
}

fn ensure_clip<'a>(live: &'a mut LiveSet, track_index: i64, clip_index: i64, length: f64) -> Result<&'a mut Clip, FacadeError> {
    let slot = live.slot_mut(track_index, clip_index)?;
    if slot.clip.is_none() {
        slot.clip = Some(Clip {
            name: format!("Clip {} {}", track_index, clip_index),
            length,
            loop_end: length,
            is_midi_clip: true,
            ..Default::default()
        });
    }
    Ok(slot.clip.as_mut().unwrap())
}

pub fn add_basic_drum_pattern(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let clip_index = required_i64(params, "clip_index")?;
    let length = f64_param(params, "length", 4.0).max(0.0);
    let velocity = i64_param(params, "velocity", 100).clamp(0, 127) as u8;
    let style = required_str(params, "style")?;

    let notes = match style.as_str() {
        "trap" => trap_notes(length, velocity),
        _ => four_on_floor_notes(length, velocity), // four_on_floor, and the fallback for unknown styles
    };
    let count = notes.len();

    let clip = ensure_clip(live, track_index, clip_index, length)?;
    clip.notes.extend(notes);

    Ok(json!({
        "track_index": track_index,
        "clip_index": clip_index,
        "style": style,
        "notes_added": count,
    }))
}

pub fn add_chord_stack(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let clip_index = required_i64(params, "clip_index")?;
    let root_midi = i64_param(params, "root_midi", 60).clamp(0, 127);
    let quality = params
        .get("quality")
        .and_then(Value::as_str)
        .unwrap_or("major")
        .to_string();
    let bars = i64_param(params, "bars", 4).max(1);
    let chord_length = f64_param(params, "chord_length", 1.0).max(0.01);

    let intervals = chord_intervals(&quality);
    let total_length = chord_length * bars as f64;

    let mut notes = Vec::new();
    for bar in 0..bars {
        let start = bar as f64 * chord_length;
        for interval in intervals {
            let pitch = (root_midi + interval).clamp(0, 127) as u8;
            notes.push(note(pitch, start, chord_length, 100));
        }
    }
    let count = notes.len();

    let clip = ensure_clip(live, track_index, clip_index, total_length)?;
    clip.notes.extend(notes);

    Ok(json!({
        "track_index": track_index,
        "clip_index": clip_index,
        "quality": quality,
        "bars": bars,
        "notes_added": count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json: Value) -> HashMap<String, Value> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn add_basic_drum_pattern_creates_clip_when_absent() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Midi, "MIDI");
        let result = add_basic_drum_pattern(
            &params(json!({"track_index": 0, "clip_index": 0, "style": "four_on_floor"})),
            &mut live,
        )
        .unwrap();
        assert!(result["notes_added"].as_u64().unwrap() > 0);
        assert!(live.clip_ref(0, 0).unwrap().notes.len() > 0);
    }

    #[test]
    fn add_chord_stack_unknown_quality_falls_back_to_major() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Midi, "MIDI");
        add_chord_stack(
            &params(json!({"track_index": 0, "clip_index": 0, "quality": "nonsense", "bars": 1})),
            &mut live,
        )
        .unwrap();
        let clip = live.clip_ref(0, 0).unwrap();
        let pitches: Vec<u8> = clip.notes.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![60, 64, 67]);
    }
}
