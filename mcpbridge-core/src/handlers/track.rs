//! Track CRUD & mixer handlers, plus return-track CRUD (§4.5).

use std::collections::HashMap;

use serde_json::{json, Value};

use mcpbridge_types::{ClipSlotView, ClipSummary, DeviceKind as ViewDeviceKind, DeviceSummary, MonitorState, RoutingView, SendView, TrackKind, TrackView};

use crate::error::FacadeError;
use crate::facade::{monitor_to_str, resolve_option};
use crate::params::{bool_param, f64_param, i64_param, opt_str_param, required_f64, required_i64};
use crate::state::{DeviceKind, LiveSet, Monitor, Track};

const VOLUME_MIN: f64 = 0.0;
const VOLUME_MAX: f64 = 1.0;
const PAN_MIN: f64 = -1.0;
const PAN_MAX: f64 = 1.0;

fn device_kind_view(kind: DeviceKind) -> ViewDeviceKind {
    match kind {
        DeviceKind::Instrument => ViewDeviceKind::Instrument,
        DeviceKind::AudioEffect => ViewDeviceKind::AudioEffect,
        DeviceKind::MidiEffect => ViewDeviceKind::MidiEffect,
        DeviceKind::Rack => ViewDeviceKind::Rack,
        DeviceKind::DrumMachine => ViewDeviceKind::DrumMachine,
        DeviceKind::Unknown => ViewDeviceKind::Unknown,
    }
}

fn monitor_view(m: Monitor) -> MonitorState {
    match m {
        Monitor::In => MonitorState::In,
        Monitor::Auto => MonitorState::Auto,
        Monitor::Off => MonitorState::Off,
    }
}

pub(crate) fn track_view(live: &LiveSet, index: usize) -> TrackView {
    let track = &live.tracks[index];
    TrackView {
        index,
        name: track.name.clone(),
        kind: track.kind,
        mute: track.mute,
        solo: track.solo,
        arm: track.arm,
        volume: track.volume,
        panning: track.panning,
        sends: track
            .sends
            .iter()
            .enumerate()
            .map(|(i, s)| SendView {
                index: i,
                return_track_name: live.return_tracks.get(i).map(|r| r.name.clone()),
                value: s.value,
                min: s.min,
                max: s.max,
            })
            .collect(),
        clip_slots: track
            .clip_slots
            .iter()
            .map(|slot| ClipSlotView {
                has_clip: slot.clip.is_some(),
                clip: slot.clip.as_ref().map(|c| ClipSummary {
                    name: c.name.clone(),
                    length: c.length,
                    is_playing: c.is_playing,
                    is_recording: c.is_recording,
                }),
            })
            .collect(),
        devices: track
            .devices
            .iter()
            .enumerate()
            .map(|(i, d)| DeviceSummary {
                index: i,
                name: d.name.clone(),
                class_name: d.class_name.clone(),
                kind: device_kind_view(d.kind),
            })
            .collect(),
        routing: RoutingView {
            input_type: track.routing.input_type.clone(),
            input_channel: track.routing.input_channel.clone(),
            output_type: track.routing.output_type.clone(),
            output_channel: track.routing.output_channel.clone(),
            monitor: monitor_view(track.routing.monitor),
        },
    }
}

pub fn get_track_info(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "track_index")?;
    live.track_ref(index)?;
    Ok(serde_json::to_value(track_view(live, index as usize)).expect("TrackView always serializes"))
}

pub fn create_midi_track(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = i64_param(params, "index", -1);
    let at = live.push_track(index, TrackKind::Midi, "MIDI");
    Ok(json!({"index": at, "name": live.tracks[at].name}))
}

pub fn create_audio_track(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = i64_param(params, "index", -1);
    let at = live.push_track(index, TrackKind::Audio, "Audio");
    Ok(json!({"index": at, "name": live.tracks[at].name}))
}

pub fn delete_track(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "track_index")?;
    live.track_ref(index)?;
    let removed = live.tracks.remove(index as usize);
    Ok(json!({"deleted": true, "index": index, "name": removed.name}))
}

pub fn duplicate_track(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "track_index")?;
    let source = live.track_ref(index)?.clone();
    let mut copy = source.clone();
    copy.name = format!("{} Copy", source.name);
    let new_index = (index as usize) + 1;
    live.tracks.insert(new_index, copy);

    let target_index = params.get("target_index").and_then(Value::as_i64);
    let mut result = json!({"index": new_index, "name": live.tracks[new_index].name, "duplicated_from": index});
    if let Some(target) = target_index {
        if target as usize != new_index {
            result["note"] = json!(format!(
                "target_index {} was requested, but duplication places the copy next to its source at index {}",
                target, new_index
            ));
        }
    }
    Ok(result)
}

pub fn set_track_name(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "track_index")?;
    let name = crate::params::required_str(params, "name")?;
    live.track_mut(index)?.name = name.clone();
    Ok(json!({"index": index, "name": name}))
}

pub fn set_track_volume(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "track_index")?;
    let volume = required_f64(params, "volume")?.clamp(VOLUME_MIN, VOLUME_MAX);
    live.track_mut(index)?.volume = volume;
    Ok(json!({"index": index, "volume": volume}))
}

pub fn set_track_panning(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "track_index")?;
    let panning = required_f64(params, "panning")?.clamp(PAN_MIN, PAN_MAX);
    live.track_mut(index)?.panning = panning;
    Ok(json!({"index": index, "panning": panning}))
}

pub fn set_track_mute(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "track_index")?;
    let mute = crate::params::required_bool(params, "mute")?;
    live.track_mut(index)?.mute = mute;
    Ok(json!({"index": index, "mute": mute}))
}

pub fn set_track_solo(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "track_index")?;
    let solo = crate::params::required_bool(params, "solo")?;
    live.track_mut(index)?.solo = solo;
    Ok(json!({"index": index, "solo": solo}))
}

pub fn set_track_arm(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "track_index")?;
    let arm = crate::params::required_bool(params, "arm")?;
    live.track_mut(index)?.arm = arm;
    Ok(json!({"index": index, "arm": arm}))
}

pub fn set_send_level(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let send_index = required_i64(params, "send_index")?;
    let level = required_f64(params, "level")?;
    let track = live.track_mut(track_index)?;
    let send = track
        .sends
        .get_mut(send_index as usize)
        .filter(|_| send_index >= 0)
        .ok_or_else(|| FacadeError::out_of_range(format!("send index {} out of range", send_index)))?;
    send.value = level.clamp(send.min, send.max);
    Ok(json!({"track_index": track_index, "send_index": send_index, "level": send.value}))
}

/// Normalize the various `sends` payload shapes (§4.5, §9) into a flat
/// `[(target, level)]` list. `target` is either a send index, a
/// return-track name, or positional (implied by array position).
fn parse_sends_payload(payload: &Value) -> Result<Vec<(Value, f64)>, FacadeError> {
    match payload {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| {
                let level = v
                    .as_f64()
                    .ok_or_else(|| FacadeError::bad_value(format!("send level for '{}' is not numeric", k)))?;
                Ok((Value::String(k.clone()), level))
            })
            .collect(),
        Value::Array(arr) if arr.iter().all(Value::is_number) => Ok(arr
            .iter()
            .enumerate()
            .map(|(i, v)| (Value::from(i as i64), v.as_f64().unwrap_or(0.0)))
            .collect()),
        Value::Array(arr) => arr
            .iter()
            .map(|entry| match entry {
                Value::Array(pair) if pair.len() == 2 => {
                    let level = pair[1]
                        .as_f64()
                        .ok_or_else(|| FacadeError::bad_value("send pair level is not numeric".to_string()))?;
                    Ok((pair[0].clone(), level))
                }
                Value::Object(obj) => {
                    let target = obj
                        .get("index")
                        .or_else(|| obj.get("name"))
                        .or_else(|| obj.get("send"))
                        .cloned()
                        .ok_or_else(|| FacadeError::bad_value("send entry missing index/name/send".to_string()))?;
                    let level = obj
                        .get("level")
                        .or_else(|| obj.get("value"))
                        .and_then(Value::as_f64)
                        .ok_or_else(|| FacadeError::bad_value("send entry missing level/value".to_string()))?;
                    Ok((target, level))
                }
                other => Err(FacadeError::bad_value(format!("unsupported send entry {}", other))),
            })
            .collect(),
        _ => Err(FacadeError::bad_value("sends must be a mapping or list".to_string())),
    }
}

fn resolve_send_index(track: &Track, return_names: &[String], target: &Value) -> Option<usize> {
    if let Some(i) = target.as_i64() {
        if i >= 0 && (i as usize) < track.sends.len() {
            return Some(i as usize);
        }
        return None;
    }
    if let Some(s) = target.as_str() {
        if let Ok(i) = s.parse::<usize>() {
            if i < track.sends.len() {
                return Some(i);
            }
        }
        return resolve_option(return_names, Some(target)).and_then(|name| {
            return_names.iter().position(|n| n == name)
        });
    }
    None
}

pub fn configure_track_routing(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let return_names: Vec<String> = live.return_tracks.iter().map(|r| r.name.clone()).collect();
    let track = live.track_mut(track_index)?;

    if let Some(t) = resolve_option(&track.routing.available_input_types, params.get("input_type")) {
        track.routing.input_type = Some(t.to_string());
    }
    if let Some(c) = resolve_option(&track.routing.available_input_channels, params.get("input_channel")) {
        track.routing.input_channel = Some(c.to_string());
    }
    if let Some(t) = resolve_option(&track.routing.available_output_types, params.get("output_type")) {
        track.routing.output_type = Some(t.to_string());
    }
    if let Some(c) = resolve_option(&track.routing.available_output_channels, params.get("output_channel")) {
        track.routing.output_channel = Some(c.to_string());
    }
    if let Some(m) = params.get("monitor").and_then(Value::as_str).and_then(crate::facade::monitor_from_str) {
        track.routing.monitor = m;
    }
    if let Some(arm) = params.get("arm").and_then(Value::as_bool) {
        track.arm = arm;
    }

    let mut send_errors = Vec::new();
    let mut send_updates = Vec::new();
    if let Some(sends_payload) = params.get("sends") {
        match parse_sends_payload(sends_payload) {
            Ok(pairs) => {
                for (target, level) in pairs {
                    match resolve_send_index(track, &return_names, &target) {
                        Some(i) => {
                            let send = &mut track.sends[i];
                            send.value = level.clamp(send.min, send.max);
                            send_updates.push(json!({"index": i, "value": send.value}));
                        }
                        None => send_errors.push(json!({"target": target, "error": "could not resolve send target"})),
                    }
                }
            }
            Err(e) => send_errors.push(json!({"error": e.message})),
        }
    }

    Ok(json!({
        "track_index": track_index,
        "routing": {
            "input_type": track.routing.input_type,
            "input_channel": track.routing.input_channel,
            "output_type": track.routing.output_type,
            "output_channel": track.routing.output_channel,
        },
        "monitor": monitor_to_str(track.routing.monitor),
        "arm": track.arm,
        "sends": {"updated": send_updates, "errors": send_errors},
    }))
}

pub fn create_return_track(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let name = opt_str_param(params, "name").unwrap_or_else(|| format!("Return {}", live.return_tracks.len() + 1));
    live.return_tracks.push(crate::state::ReturnTrack {
        name: name.clone(),
        volume: 0.85,
        panning: 0.0,
    });
    for track in live.tracks.iter_mut() {
        track.sends.push(crate::state::Send::default());
    }
    Ok(json!({"index": live.return_tracks.len() - 1, "name": name}))
}

pub fn delete_return_track(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "index")?;
    live.return_track_ref(index)?;
    let removed = live.return_tracks.remove(index as usize);
    for track in live.tracks.iter_mut() {
        if (index as usize) < track.sends.len() {
            track.sends.remove(index as usize);
        }
    }
    Ok(json!({"deleted": true, "index": index, "name": removed.name}))
}

pub fn set_return_track_name(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let index = required_i64(params, "index")?;
    let name = crate::params::required_str(params, "name")?;
    live.return_track_mut(index)?.name = name.clone();
    Ok(json!({"index": index, "name": name}))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json: Value) -> HashMap<String, Value> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn create_midi_track_appends_by_default() {
        let mut live = LiveSet::new();
        let result = create_midi_track(&params(json!({"index": -1})), &mut live).unwrap();
        assert_eq!(result["index"], 0);
        assert_eq!(live.tracks.len(), 1);
        assert_eq!(live.tracks[0].kind, TrackKind::Midi);
    }

    #[test]
    fn set_track_volume_clamps_to_range() {
        let mut live = LiveSet::new();
        live.push_track(-1, TrackKind::Audio, "Audio");
        let result = set_track_volume(&params(json!({"track_index": 0, "volume": 5.0})), &mut live).unwrap();
        assert_eq!(result["volume"], 1.0);
    }

    #[test]
    fn delete_track_out_of_range_errors() {
        let mut live = LiveSet::new();
        let err = delete_track(&params(json!({"track_index": 0})), &mut live).unwrap_err();
        assert_eq!(err.kind, mcpbridge_types::ErrorKind::OutOfRange);
    }
}
