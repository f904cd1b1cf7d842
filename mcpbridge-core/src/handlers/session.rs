//! Session / transport handlers (§4.5).

use std::collections::HashMap;

use serde_json::{json, Value};

use mcpbridge_types::{MasterTrackView, SessionView};

use crate::error::FacadeError;
use crate::params::{bool_param, f64_param, required_bool, required_f64, required_i64};
use crate::state::LiveSet;

pub fn get_session_info(_params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let view = SessionView {
        tempo: live.tempo,
        signature_numerator: live.signature_numerator,
        signature_denominator: live.signature_denominator,
        is_playing: live.is_playing,
        track_count: live.tracks.len(),
        return_track_count: live.return_tracks.len(),
        scene_count: live.scenes.len(),
        master_track: MasterTrackView {
            name: "Master".to_string(),
            volume: live.master.volume,
            panning: live.master.panning,
        },
    };
    Ok(serde_json::to_value(view).expect("SessionView always serializes"))
}

pub fn set_tempo(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    live.tempo = required_f64(params, "tempo")?;
    Ok(json!({"tempo": live.tempo}))
}

pub fn set_time_signature(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    live.signature_numerator = required_i64(params, "numerator")?.max(1) as u32;
    live.signature_denominator = required_i64(params, "denominator")?.max(1) as u32;
    Ok(json!({
        "signature_numerator": live.signature_numerator,
        "signature_denominator": live.signature_denominator,
    }))
}

pub fn start_playback(_params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    live.is_playing = true;
    Ok(json!({"playing": live.is_playing}))
}

pub fn stop_playback(_params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    live.is_playing = false;
    Ok(json!({"playing": live.is_playing}))
}

pub fn set_record_mode(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    live.record_mode = required_bool(params, "enabled")?;
    Ok(json!({"record_mode": live.record_mode}))
}

pub fn trigger_session_record(_params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    live.session_record = !live.session_record;
    Ok(json!({"session_record": live.session_record}))
}

pub fn capture_midi(_params: &HashMap<String, Value>, _live: &mut LiveSet) -> Result<Value, FacadeError> {
    // This façade has no live MIDI capture buffer to drain; report the
    // capability as absent rather than pretending to have captured anything.
    Ok(json!({"captured": false, "error": "capture_midi not supported"}))
}

pub fn set_overdub(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    live.arrangement_overdub = bool_param(params, "enabled", live.arrangement_overdub);
    Ok(json!({
        "arrangement_overdub": live.arrangement_overdub,
        "session_record": live.session_record,
    }))
}

pub fn get_song_context(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let include_clips = bool_param(params, "include_clips", false);

    let tracks: Vec<Value> = live
        .tracks
        .iter()
        .enumerate()
        .map(|(idx, track)| {
            let devices: Vec<Value> = track
                .devices
                .iter()
                .enumerate()
                .map(|(dev_idx, d)| json!({"index": dev_idx, "name": d.name, "class_name": d.class_name}))
                .collect();

            let mut has_clips = false;
            let mut clips: Vec<Value> = Vec::new();
            for (slot_idx, slot) in track.clip_slots.iter().enumerate() {
                if let Some(clip) = &slot.clip {
                    has_clips = true;
                    if include_clips {
                        clips.push(json!({
                            "slot": slot_idx,
                            "name": clip.name,
                            "length": clip.length,
                            "playing": clip.is_playing,
                        }));
                    }
                }
            }

            let mut obj = json!({
                "index": idx,
                "name": track.name,
                "type": if track.kind == mcpbridge_types::TrackKind::Midi { "midi" } else { "audio" },
                "armed": track.arm,
                "muted": track.mute,
                "soloed": track.solo,
                "devices": devices,
                "has_clips": has_clips,
            });
            if include_clips && !clips.is_empty() {
                obj["clips"] = json!(clips);
            }
            obj
        })
        .collect();

    let scenes: Vec<Value> = live
        .scenes
        .iter()
        .enumerate()
        .map(|(idx, scene)| json!({"index": idx, "name": scene.name}))
        .collect();

    Ok(json!({
        "tempo": live.tempo,
        "time_signature": format!("{}/{}", live.signature_numerator, live.signature_denominator),
        "playing": live.is_playing,
        "track_count": tracks.len(),
        "scene_count": scenes.len(),
        "tracks": tracks,
        "scenes": scenes,
    }))
}
