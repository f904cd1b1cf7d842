//! Ad-hoc MIDI test trigger (§4.5): ensures a MIDI clip exists at the
//! target slot, writes a single test note into it, optionally emits a
//! raw MIDI CC message, and optionally fires the clip — all in one
//! round trip, so a caller can audition a sound without wiring up a
//! full pattern first.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::FacadeError;
use crate::facade::clamp_note;
use crate::params::{bool_param, f64_param, i64_param, required_i64};
use crate::state::{Clip, LiveSet};
use mcpbridge_types::Note;

/// `status = 0xB0 | (channel & 0x0F)` — a Control Change message on
/// `channel` (§4.5).
fn control_change_status(channel: i64) -> u8 {
    0xB0 | (channel as u8 & 0x0F)
}

pub fn trigger_test_midi(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let clip_index = required_i64(params, "clip_index")?;
    let length = f64_param(params, "length", 4.0).max(0.01);
    let pitch = i64_param(params, "pitch", 60).clamp(0, 127) as u8;
    let velocity = i64_param(params, "velocity", 100).clamp(0, 127) as u8;
    let duration = f64_param(params, "duration", 0.25).max(0.01);
    let start_time = f64_param(params, "start_time", 0.0).max(0.0);
    let overwrite_clip = bool_param(params, "overwrite_clip", false);
    let fire_clip = bool_param(params, "fire_clip", false);
    let cc_value = i64_param(params, "cc_value", 0).clamp(0, 127);
    let channel = i64_param(params, "channel", 0).clamp(0, 15);
    let cc_number = params.get("cc_number").and_then(Value::as_i64);

    {
        let slot = live.slot_mut(track_index, clip_index)?;
        match &slot.clip {
            None => {
                slot.clip = Some(Clip {
                    name: format!("Clip {} {}", track_index, clip_index),
                    length,
                    loop_end: length,
                    is_midi_clip: true,
                    ..Default::default()
                });
            }
            Some(existing) if !existing.is_midi_clip => {
                return Err(FacadeError::bad_value(format!(
                    "track {} slot {} holds an audio clip, not MIDI",
                    track_index, clip_index
                )));
            }
            Some(_) if !overwrite_clip => {
                return Err(FacadeError::conflict(format!(
                    "track {} slot {} already holds a clip; pass overwrite_clip=true to write into it",
                    track_index, clip_index
                )));
            }
            Some(_) => {}
        }
    }

    let extended = live.supports_extended_notes;
    let note_id = if extended { Some(live.allocate_note_id()) } else { None };
    let mut note = Note {
        pitch,
        start_time,
        duration,
        velocity,
        mute: false,
        probability: None,
        velocity_deviation: None,
        release_velocity: None,
        note_id,
    };
    clamp_note(&mut note);

    let clip = live.clip_mut(track_index, clip_index)?;
    clip.notes.push(note);

    let cc_sent = cc_number.map(|number| {
        json!({
            "status": control_change_status(channel),
            "number": number.clamp(0, 127),
            "value": cc_value,
            "channel": channel,
        })
    });

    if fire_clip {
        let clip = live.clip_mut(track_index, clip_index)?;
        clip.is_playing = true;
        live.is_playing = true;
    }

    Ok(json!({
        "track_index": track_index,
        "clip_index": clip_index,
        "pitch": pitch,
        "velocity": velocity,
        "duration": duration,
        "start_time": start_time,
        "fired": fire_clip,
        "cc_sent": cc_sent,
        "triggered": true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json: Value) -> HashMap<String, Value> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn creates_clip_when_slot_empty() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Midi, "MIDI");
        let result = trigger_test_midi(
            &params(json!({"track_index": 0, "clip_index": 0, "pitch": 200})),
            &mut live,
        )
        .unwrap();
        assert_eq!(result["pitch"], 127);
        let clip = live.clip_ref(0, 0).unwrap();
        assert_eq!(clip.notes.len(), 1);
    }

    #[test]
    fn rejects_occupied_slot_without_overwrite() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Midi, "MIDI");
        trigger_test_midi(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        let err = trigger_test_midi(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap_err();
        assert_eq!(err.kind, mcpbridge_types::ErrorKind::Conflict);
    }

    #[test]
    fn overwrite_clip_allows_writing_into_existing_clip() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Midi, "MIDI");
        trigger_test_midi(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        trigger_test_midi(
            &params(json!({"track_index": 0, "clip_index": 0, "overwrite_clip": true})),
            &mut live,
        )
        .unwrap();
        let clip = live.clip_ref(0, 0).unwrap();
        assert_eq!(clip.notes.len(), 2);
    }

    #[test]
    fn emits_control_change_with_expected_status_byte() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Midi, "MIDI");
        let result = trigger_test_midi(
            &params(json!({"track_index": 0, "clip_index": 0, "cc_number": 74, "cc_value": 64, "channel": 2})),
            &mut live,
        )
        .unwrap();
        assert_eq!(result["cc_sent"]["status"], 0xB2);
        assert_eq!(result["cc_sent"]["number"], 74);
    }

    #[test]
    fn fire_clip_flag_marks_clip_playing() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Midi, "MIDI");
        trigger_test_midi(
            &params(json!({"track_index": 0, "clip_index": 0, "fire_clip": true})),
            &mut live,
        )
        .unwrap();
        assert!(live.clip_ref(0, 0).unwrap().is_playing);
    }
}
