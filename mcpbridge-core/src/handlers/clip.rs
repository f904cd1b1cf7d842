//! Clip handlers (§4.5): create/delete/duplicate, note editing,
//! quantization, and clip listing.

use std::collections::HashMap;

use serde_json::{json, Value};

use mcpbridge_types::ClipView;

use crate::error::FacadeError;
use crate::facade::{clamp_note, notes_from_json};
use crate::params::{bool_param, f64_param, opt_str_param, required_f64, required_i64};
use crate::state::{Clip, LiveSet};

fn clip_view(track_index: usize, clip_index: usize, clip: &Clip) -> ClipView {
    ClipView {
        track_index,
        clip_index,
        name: clip.name.clone(),
        length: clip.length,
        looping: clip.looping,
        loop_start: clip.loop_start,
        loop_end: clip.loop_end,
        is_midi_clip: clip.is_midi_clip,
        notes: clip.notes.clone(),
    }
}

pub fn create_clip(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let clip_index = required_i64(params, "clip_index")?;
    let length = f64_param(params, "length", 4.0).max(0.0);
    let is_midi_clip = bool_param(params, "is_midi_clip", true);

    let slot = live.slot_mut(track_index, clip_index)?;
    if slot.clip.is_some() {
        return Err(FacadeError::conflict(format!(
            "track {} slot {} already holds a clip",
            track_index, clip_index
        )));
    }
    slot.clip = Some(Clip {
        name: format!("Clip {} {}", track_index, clip_index),
        length,
        loop_end: length,
        is_midi_clip,
        ..Default::default()
    });
    Ok(serde_json::to_value(clip_view(
        track_index as usize,
        clip_index as usize,
        slot.clip.as_ref().unwrap(),
    ))
    .expect("ClipView always serializes"))
}

pub fn delete_clip(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let clip_index = required_i64(params, "clip_index")?;
    let slot = live.slot_mut(track_index, clip_index)?;
    if slot.clip.take().is_none() {
        return Err(FacadeError::not_found(format!(
            "no clip at track {} slot {}",
            track_index, clip_index
        )));
    }
    Ok(json!({"deleted": true, "track_index": track_index, "clip_index": clip_index}))
}

/// Copy the clip at `(track_index, clip_index)` into
/// `(target_track_index?, target_clip_index?)` (both default to the
/// source position's track / next slot). MIDI clips copy notes and
/// loop bounds in full; audio clips are best-effort — the reference
/// host API has no "duplicate audio clip" call, so this creates an
/// empty clip of the same length and reports the gap via `warning`
/// (§4.5, §7 `Unsupported`).
pub fn duplicate_clip(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let clip_index = required_i64(params, "clip_index")?;
    let source = live.clip_ref(track_index, clip_index)?.clone();

    let target_track_index = params
        .get("target_track_index")
        .and_then(Value::as_i64)
        .unwrap_or(track_index);
    let target_clip_index = params
        .get("target_clip_index")
        .and_then(Value::as_i64)
        .unwrap_or(clip_index);

    let same_slot = target_track_index == track_index && target_clip_index == clip_index;
    let target_slot = live.slot_mut(target_track_index, target_clip_index)?;
    if target_slot.clip.is_some() && !same_slot {
        return Err(FacadeError::conflict(format!(
            "track {} slot {} already holds a clip",
            target_track_index, target_clip_index
        )));
    }

    let warning = if source.is_midi_clip {
        let mut copy = source;
        copy.name = format!("{} Copy", copy.name);
        target_slot.clip = Some(copy);
        None
    } else {
        target_slot.clip = Some(Clip {
            name: format!("{} Copy", source.name),
            length: source.length,
            loop_start: 0.0,
            loop_end: source.length,
            is_midi_clip: false,
            ..Default::default()
        });
        Some("audio clip duplication is not supported via the host API; created an empty clip of the same length".to_string())
    };

    let mut result = serde_json::to_value(clip_view(
        target_track_index as usize,
        target_clip_index as usize,
        target_slot.clip.as_ref().unwrap(),
    ))
    .expect("ClipView always serializes");
    if let Some(warning) = warning {
        result["warning"] = json!(warning);
    }
    Ok(result)
}

pub fn add_notes_to_clip(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let clip_index = required_i64(params, "clip_index")?;
    let notes_value = crate::params::required_value(params, "notes")?;
    let mut notes = notes_from_json(notes_value)?;

    let extended = live.supports_extended_notes;
    for note in notes.iter_mut() {
        if extended && note.note_id.is_none() {
            note.note_id = Some(live.allocate_note_id());
        }
    }

    let clip = live.clip_mut(track_index, clip_index)?;
    let added = notes.len();
    clip.notes.extend(notes);
    Ok(json!({
        "track_index": track_index,
        "clip_index": clip_index,
        "note_count": added,
        "total_notes": clip.notes.len()
    }))
}

pub fn set_clip_name(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let clip_index = required_i64(params, "clip_index")?;
    let name = crate::params::required_str(params, "name")?;
    live.clip_mut(track_index, clip_index)?.name = name.clone();
    Ok(json!({"track_index": track_index, "clip_index": clip_index, "name": name}))
}

pub fn set_clip_loop(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let clip_index = required_i64(params, "clip_index")?;
    let clip = live.clip_mut(track_index, clip_index)?;

    let new_start = params
        .get("start")
        .and_then(Value::as_f64)
        .map(|s| s.max(0.0))
        .unwrap_or(clip.loop_start);
    let new_end = params
        .get("end")
        .and_then(Value::as_f64)
        .unwrap_or(clip.loop_end);
    if new_end <= new_start {
        return Err(FacadeError::bad_value(format!(
            "end {} must be greater than start {}",
            new_end, new_start
        )));
    }

    clip.looping = bool_param(params, "loop_on", true);
    clip.loop_start = new_start;
    clip.loop_end = new_end;
    Ok(json!({
        "track_index": track_index,
        "clip_index": clip_index,
        "looping": clip.looping,
        "loop_start": clip.loop_start,
        "loop_end": clip.loop_end,
    }))
}

pub fn set_clip_length(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let clip_index = required_i64(params, "clip_index")?;
    let length = f64_param(params, "length", 4.0).max(0.0);
    let clip = live.clip_mut(track_index, clip_index)?;
    clip.length = length;
    if clip.loop_end < length {
        clip.loop_end = length;
    }
    Ok(json!({"track_index": track_index, "clip_index": clip_index, "length": clip.length}))
}

/// Grid spacing, in beats, for a `grid` encoded as a divisor of a
/// whole note (§4.5): `grid=16` is a 1/16-note grid, i.e. `4.0/16 =
/// 0.25` beats (a whole note spans 4 beats). `grid <= 0` is not a
/// valid divisor; fall back to a 1/16-note grid rather than dividing
/// by zero.
fn grid_spacing_beats(grid: i64) -> f64 {
    if grid <= 0 {
        0.25
    } else {
        4.0 / grid as f64
    }
}

pub fn quantize_clip(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let clip_index = required_i64(params, "clip_index")?;
    let grid = required_i64(params, "grid")?;
    let amount = required_f64(params, "amount")?.clamp(0.0, 1.0);
    let spacing = grid_spacing_beats(grid);

    let clip = live.clip_mut(track_index, clip_index)?;
    for note in clip.notes.iter_mut() {
        let snapped_start = (note.start_time / spacing).round() * spacing;
        note.start_time += amount * (snapped_start - note.start_time);
        let snapped_duration = (note.duration / spacing).round() * spacing;
        note.duration += amount * (snapped_duration - note.duration);
        clamp_note(note);
    }
    Ok(json!({
        "track_index": track_index,
        "clip_index": clip_index,
        "grid": grid,
        "amount": amount,
        "notes_quantized": clip.notes.len(),
    }))
}

pub fn list_clips(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_filter = params.get("track_index").and_then(Value::as_i64);
    let name_filter = opt_str_param(params, "name_pattern");
    let mode = crate::params::str_param(params, "match_mode", "contains");

    let mut clips = Vec::new();
    for (track_index, track) in live.tracks.iter().enumerate() {
        if let Some(t) = track_filter {
            if t >= 0 && t as usize != track_index {
                continue;
            }
        }
        for (clip_index, slot) in track.clip_slots.iter().enumerate() {
            if let Some(clip) = &slot.clip {
                if let Some(name) = &name_filter {
                    if !crate::facade::name_matches(&clip.name, Some(name), &mode) {
                        continue;
                    }
                }
                clips.push(json!({
                    "track_index": track_index,
                    "track_name": track.name,
                    "clip_index": clip_index,
                    "name": clip.name,
                    "length": clip.length,
                    "is_playing": clip.is_playing,
                    "is_recording": clip.is_recording,
                }));
            }
        }
    }
    Ok(json!({"clips": clips, "count": clips.len()}))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json: Value) -> HashMap<String, Value> {
        serde_json::from_value(json).unwrap()
    }

    fn with_track() -> LiveSet {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Midi, "MIDI");
        live
    }

    #[test]
    fn create_clip_rejects_occupied_slot() {
        let mut live = with_track();
        create_clip(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        let err = create_clip(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap_err();
        assert_eq!(err.kind, mcpbridge_types::ErrorKind::Conflict);
    }

    #[test]
    fn add_notes_assigns_ids_and_clamps_duration() {
        let mut live = with_track();
        create_clip(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        let result = add_notes_to_clip(
            &params(json!({
                "track_index": 0,
                "clip_index": 0,
                "notes": [{"pitch": 60, "start_time": 0.0, "duration": 0.0, "velocity": 100}],
            })),
            &mut live,
        )
        .unwrap();
        assert_eq!(result["note_count"], 1);
        let clip = live.clip_ref(0, 0).unwrap();
        assert!(clip.notes[0].note_id.is_some());
        assert!(clip.notes[0].duration >= 0.01);
    }

    #[test]
    fn quantize_clip_snaps_toward_grid() {
        let mut live = with_track();
        create_clip(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        add_notes_to_clip(
            &params(json!({
                "track_index": 0,
                "clip_index": 0,
                "notes": [{"pitch": 60, "start_time": 0.1, "duration": 0.25, "velocity": 100}],
            })),
            &mut live,
        )
        .unwrap();
        quantize_clip(&params(json!({"track_index": 0, "clip_index": 0, "grid": 16, "amount": 1.0})), &mut live).unwrap();
        let clip = live.clip_ref(0, 0).unwrap();
        assert!((clip.notes[0].start_time - 0.0).abs() < 1e-9);
        assert!((clip.notes[0].duration - 0.25).abs() < 1e-9);
    }

    #[test]
    fn quantize_clip_matches_reference_scenario() {
        let mut live = with_track();
        create_clip(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        add_notes_to_clip(
            &params(json!({
                "track_index": 0,
                "clip_index": 0,
                "notes": [{"pitch": 60, "start_time": 0.13, "duration": 0.37, "velocity": 100}],
            })),
            &mut live,
        )
        .unwrap();
        quantize_clip(&params(json!({"track_index": 0, "clip_index": 0, "grid": 16, "amount": 1.0})), &mut live).unwrap();
        let clip = live.clip_ref(0, 0).unwrap();
        assert!([0.0, 0.25].iter().any(|v| (clip.notes[0].start_time - v).abs() < 1e-9));
        assert!([0.25, 0.5].iter().any(|v| (clip.notes[0].duration - v).abs() < 1e-9));
        assert_eq!(clip.notes[0].pitch, 60);
        assert_eq!(clip.notes[0].velocity, 100);
    }

    #[test]
    fn quantize_clip_amount_zero_does_not_move_notes() {
        let mut live = with_track();
        create_clip(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        add_notes_to_clip(
            &params(json!({
                "track_index": 0,
                "clip_index": 0,
                "notes": [{"pitch": 60, "start_time": 0.13, "duration": 0.37, "velocity": 100}],
            })),
            &mut live,
        )
        .unwrap();
        quantize_clip(&params(json!({"track_index": 0, "clip_index": 0, "grid": 16, "amount": 0.0})), &mut live).unwrap();
        let clip = live.clip_ref(0, 0).unwrap();
        assert!((clip.notes[0].start_time - 0.13).abs() < 1e-9);
    }

    #[test]
    fn duplicate_clip_copies_notes_to_another_track() {
        let mut live = with_track();
        live.push_track(-1, mcpbridge_types::TrackKind::Midi, "MIDI 2");
        create_clip(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        add_notes_to_clip(
            &params(json!({
                "track_index": 0,
                "clip_index": 0,
                "notes": [{"pitch": 60, "start_time": 0.0, "duration": 1.0, "velocity": 100}],
            })),
            &mut live,
        )
        .unwrap();
        let result = duplicate_clip(
            &params(json!({"track_index": 0, "clip_index": 0, "target_track_index": 1, "target_clip_index": 0})),
            &mut live,
        )
        .unwrap();
        assert_eq!(result["track_index"], 1);
        assert!(result.get("warning").is_none());
        let copy = live.clip_ref(1, 0).unwrap();
        assert_eq!(copy.notes.len(), 1);
        assert_eq!(copy.name, "Clip 0 0 Copy");
    }

    #[test]
    fn duplicate_clip_reports_audio_clips_as_unsupported() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Audio, "Audio");
        create_clip(
            &params(json!({"track_index": 0, "clip_index": 0, "is_midi_clip": false})),
            &mut live,
        )
        .unwrap();
        let result = duplicate_clip(
            &params(json!({"track_index": 0, "clip_index": 0, "target_clip_index": 1})),
            &mut live,
        )
        .unwrap();
        assert!(result["warning"].as_str().unwrap().contains("not supported"));
        let copy = live.clip_ref(0, 1).unwrap();
        assert!(copy.notes.is_empty());
        assert_eq!(copy.length, 4.0);
    }

    #[test]
    fn set_clip_loop_rejects_end_not_after_start() {
        let mut live = with_track();
        create_clip(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        let err = set_clip_loop(
            &params(json!({"track_index": 0, "clip_index": 0, "start": 2.0, "end": 2.0})),
            &mut live,
        )
        .unwrap_err();
        assert_eq!(err.kind, mcpbridge_types::ErrorKind::BadValue);
    }

    #[test]
    fn list_clips_filters_by_track() {
        let mut live = with_track();
        live.push_track(-1, mcpbridge_types::TrackKind::Audio, "Audio");
        create_clip(&params(json!({"track_index": 0, "clip_index": 0})), &mut live).unwrap();
        create_clip(&params(json!({"track_index": 1, "clip_index": 0})), &mut live).unwrap();
        let result = list_clips(&params(json!({"track_index": 1})), &mut live).unwrap();
        assert_eq!(result["count"], 1);
    }
}
