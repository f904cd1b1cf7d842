//! Clip launch handlers (§4.5): fire/stop by slot, and name-based firing.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::FacadeError;
use crate::facade::name_matches;
use crate::params::{required_i64, str_param};
use crate::state::LiveSet;

pub fn fire_clip(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let clip_index = required_i64(params, "clip_index")?;
    let clip = live.clip_mut(track_index, clip_index)?;
    clip.is_playing = true;
    live.is_playing = true;
    Ok(json!({"track_index": track_index, "clip_index": clip_index, "playing": true}))
}

pub fn stop_clip(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let clip_index = required_i64(params, "clip_index")?;
    let clip = live.clip_mut(track_index, clip_index)?;
    clip.is_playing = false;
    Ok(json!({"track_index": track_index, "clip_index": clip_index, "playing": false}))
}

/// Fire every clip, on tracks optionally filtered by `track_pattern`,
/// whose name matches `clip_pattern` under `match_mode`, honoring
/// `first_only` (§4.5, mirroring `fire_scene_by_name`'s resolution rules).
pub fn fire_clip_by_name(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let clip_pattern = crate::params::required_str(params, "clip_pattern")?;
    let mode = str_param(params, "match_mode", "contains");
    let first_only = crate::params::bool_param(params, "first_only", true);
    let track_pattern = crate::params::opt_str_param(params, "track_pattern");

    let mut matches: Vec<(usize, usize)> = Vec::new();
    for (track_index, track) in live.tracks.iter().enumerate() {
        if let Some(pattern) = &track_pattern {
            if !name_matches(&track.name, Some(pattern), &mode) {
                continue;
            }
        }
        for (clip_index, slot) in track.clip_slots.iter().enumerate() {
            if let Some(clip) = &slot.clip {
                if name_matches(&clip.name, Some(&clip_pattern), &mode) {
                    matches.push((track_index, clip_index));
                }
            }
        }
    }

    if matches.is_empty() {
        return Err(FacadeError::not_found(format!("no clip matches '{}'", clip_pattern)));
    }

    let targets: &[(usize, usize)] = if first_only { &matches[..1] } else { &matches };
    for &(track_index, clip_index) in targets {
        live.tracks[track_index].clip_slots[clip_index]
            .clip
            .as_mut()
            .expect("matched clip exists")
            .is_playing = true;
    }
    live.is_playing = true;

    let fired: Vec<Value> = targets
        .iter()
        .map(|(t, c)| json!({"track_index": t, "clip_index": c}))
        .collect();
    Ok(json!({"fired": fired, "matched": matches.len()}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::clip::create_clip;

    fn params(json: Value) -> HashMap<String, Value> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn fire_clip_sets_playing() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Midi, "MIDI");
        create_clip(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        fire_clip(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        assert!(live.clip_ref(0, 0).unwrap().is_playing);
    }

    #[test]
    fn fire_clip_by_name_errors_on_no_match() {
        let mut live = LiveSet::new();
        let err = fire_clip_by_name(&params(json!({"clip_pattern": "Nonexistent"})), &mut live).unwrap_err();
        assert_eq!(err.kind, mcpbridge_types::ErrorKind::NotFound);
    }
}
