//! Scene handlers (§4.5): create/delete/duplicate/fire/stop, plus
//! name-based firing.

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::FacadeError;
use crate::facade::name_matches;
use crate::params::{opt_str_param, required_i64, str_param};
use crate::state::{LiveSet, Scene};

pub fn create_scene(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = params.get("index").and_then(Value::as_i64).unwrap_or(-1);
    let name = opt_str_param(params, "name").unwrap_or_default();
    let scene = Scene { name };
    let insert_at = if index < 0 || index as usize >= live.scenes.len() {
        live.scenes.len()
    } else {
        index as usize
    };
    live.scenes.insert(insert_at, scene);
    for track in live.tracks.iter_mut() {
        track.clip_slots.insert(insert_at, crate::state::ClipSlot::default());
    }
    Ok(json!({"index": insert_at, "name": live.scenes[insert_at].name}))
}

pub fn delete_scene(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "index")?;
    live.scene_ref(index)?;
    let removed = live.scenes.remove(index as usize);
    for track in live.tracks.iter_mut() {
        if (index as usize) < track.clip_slots.len() {
            track.clip_slots.remove(index as usize);
        }
    }
    Ok(json!({"deleted": true, "index": index, "name": removed.name}))
}

pub fn duplicate_scene(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "index")?;
    live.scene_ref(index)?;
    let new_index = (index as usize) + 1;
    let name = {
        let source = &live.scenes[index as usize];
        if source.name.is_empty() {
            String::new()
        } else {
            format!("{} Copy", source.name)
        }
    };
    live.scenes.insert(new_index, Scene { name: name.clone() });
    for track in live.tracks.iter_mut() {
        let clip = track.clip_slots[index as usize].clip.clone();
        track
            .clip_slots
            .insert(new_index, crate::state::ClipSlot { clip });
    }
    Ok(json!({"index": new_index, "name": name, "duplicated_from": index}))
}

pub fn fire_scene(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "index")?;
    live.scene_ref(index)?;
    let mut fired = Vec::new();
    for (track_index, track) in live.tracks.iter_mut().enumerate() {
        if let Some(slot) = track.clip_slots.get_mut(index as usize) {
            if let Some(clip) = slot.clip.as_mut() {
                clip.is_playing = true;
                fired.push(track_index);
            }
        }
    }
    live.is_playing = true;
    live.selected_scene = Some(index as usize);
    Ok(json!({"index": index, "fired_tracks": fired}))
}

pub fn stop_scene(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "index")?;
    live.scene_ref(index)?;
    for track in live.tracks.iter_mut() {
        if let Some(slot) = track.clip_slots.get_mut(index as usize) {
            if let Some(clip) = slot.clip.as_mut() {
                clip.is_playing = false;
            }
        }
    }

    let was_selected = live.selected_scene == Some(index as usize);
    if was_selected {
        for track in live.tracks.iter_mut() {
            for slot in track.clip_slots.iter_mut() {
                if let Some(clip) = slot.clip.as_mut() {
                    clip.is_playing = false;
                }
            }
        }
        live.is_playing = false;
    }
    Ok(json!({"index": index, "stopped": true, "global_stop": was_selected}))
}

/// Fire every scene whose name matches `name` under `match_mode`
/// (`contains` / `startswith` / `equals`), honoring `first_only`.
pub fn fire_scene_by_name(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let pattern = crate::params::required_str(params, "pattern")?;
    let mode = str_param(params, "match_mode", "contains");
    let first_only = crate::params::bool_param(params, "first_only", true);

    let matches: Vec<usize> = live
        .scenes
        .iter()
        .enumerate()
        .filter(|(_, s)| name_matches(&s.name, Some(&pattern), &mode))
        .map(|(i, _)| i)
        .collect();

    if matches.is_empty() {
        return Err(FacadeError::not_found(format!("no scene matches '{}'", pattern)));
    }

    let targets: &[usize] = if first_only { &matches[..1] } else { &matches };
    let mut fired_scenes = Vec::new();
    for &scene_index in targets {
        for track in live.tracks.iter_mut() {
            if let Some(slot) = track.clip_slots.get_mut(scene_index) {
                if let Some(clip) = slot.clip.as_mut() {
                    clip.is_playing = true;
                }
            }
        }
        fired_scenes.push(scene_index);
    }
    live.is_playing = true;
    live.selected_scene = fired_scenes.first().copied();
    Ok(json!({"fired_scenes": fired_scenes, "matched": matches.len()}))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json: Value) -> HashMap<String, Value> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn create_scene_appends_and_grows_clip_slots() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Audio, "Audio");
        let before = live.tracks[0].clip_slots.len();
        create_scene(&params(json!({"index": -1})), &mut live).unwrap();
        assert_eq!(live.tracks[0].clip_slots.len(), before + 1);
    }

    #[test]
    fn fire_scene_by_name_errors_when_nothing_matches() {
        let mut live = LiveSet::new();
        let err = fire_scene_by_name(&params(json!({"pattern": "Nonexistent"})), &mut live).unwrap_err();
        assert_eq!(err.kind, mcpbridge_types::ErrorKind::NotFound);
    }

    #[test]
    fn stop_scene_escalates_to_global_stop_only_when_selected() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Audio, "A");
        crate::handlers::clip::create_clip(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        crate::handlers::clip::create_clip(&params(json!({"track_index": 0, "clip_index": 1})), &mut live).unwrap();
        fire_scene(&params(json!({"index": 0})), &mut live).unwrap();
        live.clip_mut(0, 1).unwrap().is_playing = true;

        let result = stop_scene(&params(json!({"index": 0})), &mut live).unwrap();
        assert_eq!(result["global_stop"], true);
        assert!(!live.clip_ref(0, 0).unwrap().is_playing);
        assert!(!live.clip_ref(0, 1).unwrap().is_playing);
        assert!(!live.is_playing);
    }

    #[test]
    fn stop_scene_only_stops_row_when_not_selected() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Audio, "A");
        crate::handlers::clip::create_clip(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        crate::handlers::clip::create_clip(&params(json!({"track_index": 0, "clip_index": 1})), &mut live).unwrap();
        fire_scene(&params(json!({"index": 1})), &mut live).unwrap();
        live.clip_mut(0, 0).unwrap().is_playing = true;

        let result = stop_scene(&params(json!({"index": 0})), &mut live).unwrap();
        assert_eq!(result["global_stop"], false);
        assert!(!live.clip_ref(0, 0).unwrap().is_playing);
        assert!(live.clip_ref(0, 1).unwrap().is_playing);
    }

    #[test]
    fn delete_scene_removes_matching_clip_slot_everywhere() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Audio, "Audio");
        let scene_count = live.scenes.len();
        delete_scene(&params(json!({"index": 0})), &mut live).unwrap();
        assert_eq!(live.scenes.len(), scene_count - 1);
        assert_eq!(live.tracks[0].clip_slots.len(), scene_count - 1);
    }
}
