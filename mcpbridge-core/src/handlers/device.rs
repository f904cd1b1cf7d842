//! Device handlers (§4.5): browser-driven loading, parameter
//! get/set/batch/snapshot, sidechain and audio-input routing.

use std::collections::HashMap;

use serde_json::{json, Value};

use mcpbridge_types::ParameterView;

use crate::error::FacadeError;
use crate::facade::{device_kind_str, normalize_json, resolve_option, resolve_parameter_index};
use crate::params::{i64_param, required_i64, required_value};
use crate::state::{Device, DeviceKind, LiveSet, Parameter};

fn parameter_view(index: usize, param: &Parameter) -> ParameterView {
    ParameterView {
        index,
        name: param.name.clone(),
        min: param.min,
        max: param.max,
        value: param.value,
        is_quantized: param.is_quantized,
        value_items: param.value_items.clone(),
        unit: param.unit.clone(),
    }
}

/// Build a plausible device for the browser node at `uri`, standing in
/// for the host actually instantiating the plugin (§4.4, §9). Devices
/// resolved out of the `instruments`/`audio_effects` categories get a
/// small representative parameter set; anything else gets an empty one.
fn device_from_uri(name: &str, uri: &str) -> Device {
    let (kind, parameters): (DeviceKind, Vec<Parameter>) = if uri.contains("audio_effect") {
        (
            DeviceKind::AudioEffect,
            vec![
                Parameter {
                    name: "Device On".to_string(),
                    min: 0.0,
                    max: 1.0,
                    value: 1.0,
                    is_quantized: true,
                    value_items: Some(vec!["Off".to_string(), "On".to_string()]),
                    unit: None,
                },
                Parameter {
                    name: "Dry/Wet".to_string(),
                    min: 0.0,
                    max: 1.0,
                    value: 1.0,
                    is_quantized: false,
                    value_items: None,
                    unit: Some("%".to_string()),
                },
            ],
        )
    } else {
        (
            DeviceKind::Instrument,
            vec![Parameter {
                name: "Volume".to_string(),
                min: 0.0,
                max: 1.0,
                value: 0.85,
                is_quantized: false,
                value_items: None,
                unit: Some("dB".to_string()),
            }],
        )
    };
    Device {
        name: name.to_string(),
        class_name: name.to_string(),
        kind,
        parameters,
        supports_sidechain: matches!(kind, DeviceKind::AudioEffect),
        input_routing_types: None,
        input_routing_channels: None,
    }
}

pub fn load_browser_item(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let item_uri = crate::params::required_str(params, "item_uri")?;
    live.track_ref(track_index)?;

    let node = live
        .find_by_uri(&item_uri)
        .ok_or_else(|| FacadeError::not_found(format!("no browser item at '{}'", item_uri)))?;
    let device = device_from_uri(&node.name, &node.uri);

    let clip_index = params.get("clip_index").and_then(Value::as_i64);
    if let Some(ci) = clip_index {
        live.slot_ref(track_index, ci)?;
    }

    let track = live.track_mut(track_index)?;
    track.devices.push(device);
    Ok(json!({
        "track_index": track_index,
        "device_index": track.devices.len() - 1,
        "name": track.devices.last().unwrap().name,
        "loaded": true,
    }))
}

pub fn load_device(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let device_uri = crate::params::required_str(params, "device_uri")?;
    let mut forwarded = params.clone();
    forwarded.insert("item_uri".to_string(), Value::String(device_uri));
    forwarded.remove("device_uri");

    let mut result = load_browser_item(&forwarded, live)?;
    let device_index = result["device_index"].as_u64().expect("device_index always set") as usize;
    let device = live.device_ref(track_index, device_index as i64)?;
    let names: Vec<&str> = device.parameters.iter().map(|p| p.name.as_str()).collect();
    result["parameter_names"] = json!(names);
    Ok(result)
}

fn load_sample_instrument(
    params: &HashMap<String, Value>,
    live: &mut LiveSet,
    sampler_uri: &str,
) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let file_path = crate::params::required_str(params, "file_path")?;
    let device_slot = i64_param(params, "device_slot", -1);

    let track = live.track_mut(track_index)?;
    let slot_has_sampler = device_slot >= 0
        && (device_slot as usize) < track.devices.len()
        && matches!(track.devices[device_slot as usize].kind, DeviceKind::Instrument);

    if !slot_has_sampler {
        let node = live
            .find_by_uri(sampler_uri)
            .ok_or_else(|| FacadeError::not_found(format!("sampler instrument not found at '{}'", sampler_uri)))?;
        let device = device_from_uri(&node.name, &node.uri);
        live.track_mut(track_index)?.devices.push(device);
    }

    let stem = std::path::Path::new(&file_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&file_path)
        .to_string();

    let mut loaded = false;
    let mut warning = None;

    if let Some(node) = live.find_by_path(&format!("samples/{}", stem)) {
        loaded = node.is_loadable;
    }
    if !loaded {
        if let Some(_uri) = live.find_sample_uri_by_stem(&stem) {
            loaded = true;
        }
    }
    if !loaded {
        warning = Some(format!("could not resolve sample '{}' in the browser; hotswap not attempted", file_path));
    }

    Ok(json!({
        "track_index": track_index,
        "file_path": file_path,
        "loaded": loaded,
        "warning": warning,
    }))
}

pub fn load_simpler_with_sample(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    load_sample_instrument(params, live, "device:instrument:simpler")
}

pub fn load_sampler_with_sample(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    load_sample_instrument(params, live, "device:instrument:sampler")
}

pub fn get_device_parameters(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let device_index = required_i64(params, "device_index")?;
    let device = live.device_ref(track_index, device_index)?;
    let views: Vec<ParameterView> = device
        .parameters
        .iter()
        .enumerate()
        .map(|(i, p)| parameter_view(i, p))
        .collect();
    Ok(serde_json::to_value(views).expect("ParameterView list always serializes"))
}

pub fn set_device_parameter(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let device_index = required_i64(params, "device_index")?;
    let parameter = required_value(params, "parameter")?;
    let value = required_value(params, "value")?;

    let device = live.device_mut(track_index, device_index)?;
    let index = resolve_parameter_index(device, parameter)?;
    let normalized = normalize_json(&device.parameters[index], value)?;
    device.parameters[index].value = normalized;

    Ok(json!({
        "track_index": track_index,
        "device_index": device_index,
        "parameter": device.parameters[index].name,
        "value": normalized,
    }))
}

/// Normalize the various `parameters` payload shapes (§4.5, §9) into a
/// flat `[(parameter, value)]` list.
fn parse_parameters_payload(payload: &Value) -> Result<Vec<(Value, Value)>, FacadeError> {
    match payload {
        Value::Object(map) => Ok(map.iter().map(|(k, v)| (Value::String(k.clone()), v.clone())).collect()),
        Value::Array(arr) => arr
            .iter()
            .map(|entry| match entry {
                Value::Array(pair) if pair.len() == 2 => Ok((pair[0].clone(), pair[1].clone())),
                Value::Object(obj) => {
                    let target = obj
                        .get("parameter")
                        .or_else(|| obj.get("name"))
                        .or_else(|| obj.get("index"))
                        .cloned()
                        .ok_or_else(|| FacadeError::bad_value("parameter entry missing parameter/name/index".to_string()))?;
                    let value = obj
                        .get("value")
                        .cloned()
                        .ok_or_else(|| FacadeError::bad_value("parameter entry missing value".to_string()))?;
                    Ok((target, value))
                }
                other => Err(FacadeError::bad_value(format!("unsupported parameter entry {}", other))),
            })
            .collect(),
        _ => Err(FacadeError::bad_value("parameters must be a mapping or list".to_string())),
    }
}

pub fn set_device_parameters(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let device_index = required_i64(params, "device_index")?;
    let payload = required_value(params, "parameters")?;
    let pairs = parse_parameters_payload(payload)?;

    let device = live.device_mut(track_index, device_index)?;
    let mut updated = Vec::new();
    let mut errors = Vec::new();
    for (target, value) in pairs {
        match resolve_parameter_index(device, &target)
            .and_then(|idx| normalize_json(&device.parameters[idx], &value).map(|v| (idx, v)))
        {
            Ok((idx, normalized)) => {
                device.parameters[idx].value = normalized;
                updated.push(json!({"parameter": device.parameters[idx].name, "value": normalized}));
            }
            Err(e) => errors.push(json!({"parameter": target, "error": e.message})),
        }
    }
    Ok(json!({"track_index": track_index, "device_index": device_index, "updated": updated, "errors": errors}))
}

pub fn save_device_snapshot(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let device_index = required_i64(params, "device_index")?;
    let device = live.device_ref(track_index, device_index)?;
    let snapshot: serde_json::Map<String, Value> = device
        .parameters
        .iter()
        .map(|p| (p.name.clone(), json!(p.value)))
        .collect();
    Ok(Value::Object(snapshot))
}

pub fn apply_device_snapshot(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let device_index = required_i64(params, "device_index")?;
    let snapshot = required_value(params, "snapshot")?
        .as_object()
        .ok_or_else(|| FacadeError::bad_value("snapshot must be an object".to_string()))?
        .clone();

    let device = live.device_mut(track_index, device_index)?;
    let mut applied = Vec::new();
    let mut errors = Vec::new();
    for (name, value) in snapshot {
        match resolve_parameter_index(device, &Value::String(name.clone()))
            .and_then(|idx| normalize_json(&device.parameters[idx], &value).map(|v| (idx, v)))
        {
            Ok((idx, normalized)) => {
                device.parameters[idx].value = normalized;
                applied.push(json!({"parameter": name, "value": normalized}));
            }
            Err(e) => errors.push(json!({"parameter": name, "error": e.message})),
        }
    }
    Ok(json!({"track_index": track_index, "device_index": device_index, "applied": applied, "errors": errors}))
}

fn find_toggle_index(device: &Device, contains: &[&str]) -> Option<usize> {
    device.parameters.iter().position(|p| {
        let lower = p.name.to_lowercase();
        contains.iter().all(|needle| lower.contains(needle))
    })
}

pub fn set_device_sidechain_source(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let device_index = required_i64(params, "device_index")?;
    let source_track_index = required_i64(params, "source_track_index")?;
    live.track_ref(source_track_index)?;

    let device = live.device_mut(track_index, device_index)?;
    if !device.supports_sidechain {
        return Err(FacadeError::unsupported(format!(
            "device '{}' does not expose a sidechain input",
            device.name
        )));
    }

    let mut applied = Vec::new();
    if let Some(idx) = find_toggle_index(device, &["sidechain", "on"]) {
        device.parameters[idx].value = device.parameters[idx].max;
        applied.push(device.parameters[idx].name.clone());
    }

    // Host audio-source enums are 1-based, 0 meaning "None" (§4.5).
    let enum_value = (source_track_index + 1) as f64;
    if let Some(idx) = device.parameters.iter().position(|p| p.name.to_lowercase().contains("audio from")) {
        device.parameters[idx].value = enum_value.clamp(device.parameters[idx].min, device.parameters[idx].max);
        applied.push(device.parameters[idx].name.clone());
    }

    Ok(json!({
        "track_index": track_index,
        "device_index": device_index,
        "source_track_index": source_track_index,
        "applied_parameters": applied,
    }))
}

pub fn set_device_audio_input(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let track_index = required_i64(params, "track_index")?;
    let device_index = required_i64(params, "device_index")?;
    let input_type = params.get("input_type");
    let input_channel = params.get("input_channel");

    let device = live.device_mut(track_index, device_index)?;
    if let (Some(types), Some(channels)) = (&device.input_routing_types, &device.input_routing_channels) {
        let resolved_type = resolve_option(types, input_type).map(str::to_string);
        let resolved_channel = resolve_option(channels, input_channel).map(str::to_string);
        return Ok(json!({
            "track_index": track_index,
            "device_index": device_index,
            "input_type": resolved_type,
            "input_channel": resolved_channel,
            "via": "device_routing",
        }));
    }

    let track = live.track_mut(track_index)?;
    if let Some(t) = resolve_option(&track.routing.available_input_types, input_type) {
        track.routing.input_type = Some(t.to_string());
    }
    if let Some(c) = resolve_option(&track.routing.available_input_channels, input_channel) {
        track.routing.input_channel = Some(c.to_string());
    }
    Ok(json!({
        "track_index": track_index,
        "device_index": device_index,
        "input_type": track.routing.input_type,
        "input_channel": track.routing.input_channel,
        "via": "track_routing",
    }))
}

pub fn list_routable_devices(_params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let mut out = Vec::new();
    for (track_index, track) in live.tracks.iter().enumerate() {
        for (device_index, device) in track.devices.iter().enumerate() {
            if device.input_routing_types.is_some() || device.supports_sidechain {
                out.push(json!({
                    "track_index": track_index,
                    "device_index": device_index,
                    "name": device.name,
                    "kind": device_kind_str(device.kind),
                }));
            }
        }
    }
    Ok(json!({"devices": out, "count": out.len()}))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(json: Value) -> HashMap<String, Value> {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn load_browser_item_rejects_unknown_uri() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Midi, "MIDI");
        let err = load_browser_item(
            &params(json!({"track_index": 0, "item_uri": "device:nonexistent"})),
            &mut live,
        )
        .unwrap_err();
        assert_eq!(err.kind, mcpbridge_types::ErrorKind::NotFound);
    }

    #[test]
    fn set_device_parameter_resolves_by_name_and_clamps() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Audio, "Audio");
        load_browser_item(
            &params(json!({"track_index": 0, "item_uri": "device:audio_effect:compressor"})),
            &mut live,
        )
        .unwrap();
        let result = set_device_parameter(
            &params(json!({"track_index": 0, "device_index": 0, "parameter": "Dry/Wet", "value": "50%"})),
            &mut live,
        )
        .unwrap();
        assert_eq!(result["value"], 0.5);
    }

    #[test]
    fn sidechain_setup_rejects_devices_without_support() {
        let mut live = LiveSet::new();
        live.push_track(-1, mcpbridge_types::TrackKind::Midi, "MIDI");
        live.push_track(-1, mcpbridge_types::TrackKind::Audio, "Audio");
        load_browser_item(
            &params(json!({"track_index": 0, "item_uri": "device:instrument:simpler"})),
            &mut live,
        )
        .unwrap();
        let err = set_device_sidechain_source(
            &params(json!({"track_index": 0, "device_index": 0, "source_track_index": 1})),
            &mut live,
        )
        .unwrap_err();
        assert_eq!(err.kind, mcpbridge_types::ErrorKind::Unsupported);
    }
}
