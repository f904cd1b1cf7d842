//! The Live-Object Façade (§4.4): the narrow, stable vocabulary every
//! handler goes through instead of touching `LiveSet` fields directly.

use serde_json::Value;

use mcpbridge_types::{Note, ParamValue};

use crate::error::FacadeError;
use crate::state::{
    BrowserNode, Clip, ClipSlot, Device, DeviceKind, LiveSet, Monitor, Parameter, ReturnTrack,
    Scene, Track,
};

fn in_bounds(len: usize, index: i64, what: &str) -> Result<usize, FacadeError> {
    if index < 0 || index as usize >= len {
        return Err(FacadeError::out_of_range(format!(
            "{} index {} out of range (0..{})",
            what, index, len
        )));
    }
    Ok(index as usize)
}

impl LiveSet {
    pub fn track_ref(&self, index: i64) -> Result<&Track, FacadeError> {
        let i = in_bounds(self.tracks.len(), index, "track")?;
        Ok(&self.tracks[i])
    }

    pub fn track_mut(&mut self, index: i64) -> Result<&mut Track, FacadeError> {
        let i = in_bounds(self.tracks.len(), index, "track")?;
        Ok(&mut self.tracks[i])
    }

    pub fn return_track_ref(&self, index: i64) -> Result<&ReturnTrack, FacadeError> {
        let i = in_bounds(self.return_tracks.len(), index, "return track")?;
        Ok(&self.return_tracks[i])
    }

    pub fn return_track_mut(&mut self, index: i64) -> Result<&mut ReturnTrack, FacadeError> {
        let i = in_bounds(self.return_tracks.len(), index, "return track")?;
        Ok(&mut self.return_tracks[i])
    }

    pub fn scene_ref(&self, index: i64) -> Result<&Scene, FacadeError> {
        let i = in_bounds(self.scenes.len(), index, "scene")?;
        Ok(&self.scenes[i])
    }

    pub fn scene_mut(&mut self, index: i64) -> Result<&mut Scene, FacadeError> {
        let i = in_bounds(self.scenes.len(), index, "scene")?;
        Ok(&mut self.scenes[i])
    }

    pub fn slot_ref(&self, track_index: i64, clip_index: i64) -> Result<&ClipSlot, FacadeError> {
        let track = self.track_ref(track_index)?;
        let i = in_bounds(track.clip_slots.len(), clip_index, "clip")?;
        Ok(&track.clip_slots[i])
    }

    pub fn slot_mut(&mut self, track_index: i64, clip_index: i64) -> Result<&mut ClipSlot, FacadeError> {
        let track = self.track_mut(track_index)?;
        let i = in_bounds(track.clip_slots.len(), clip_index, "clip")?;
        Ok(&mut track.clip_slots[i])
    }

    pub fn clip_ref(&self, track_index: i64, clip_index: i64) -> Result<&Clip, FacadeError> {
        self.slot_ref(track_index, clip_index)?
            .clip
            .as_ref()
            .ok_or_else(|| FacadeError::not_found(format!(
                "no clip at track {} slot {}",
                track_index, clip_index
            )))
    }

    pub fn clip_mut(&mut self, track_index: i64, clip_index: i64) -> Result<&mut Clip, FacadeError> {
        self.slot_mut(track_index, clip_index)?
            .clip
            .as_mut()
            .ok_or_else(|| FacadeError::not_found(format!(
                "no clip at track {} slot {}",
                track_index, clip_index
            )))
    }

    pub fn device_ref(&self, track_index: i64, device_index: i64) -> Result<&Device, FacadeError> {
        let track = self.track_ref(track_index)?;
        let i = in_bounds(track.devices.len(), device_index, "device")?;
        Ok(&track.devices[i])
    }

    pub fn device_mut(&mut self, track_index: i64, device_index: i64) -> Result<&mut Device, FacadeError> {
        let track = self.track_mut(track_index)?;
        let i = in_bounds(track.devices.len(), device_index, "device")?;
        Ok(&mut track.devices[i])
    }
}

/// Resolve `parameter` (an integer index or a case-insensitive name)
/// against a device's parameter list.
pub fn resolve_parameter_index(device: &Device, parameter: &Value) -> Result<usize, FacadeError> {
    if let Some(i) = parameter.as_i64() {
        return in_bounds(device.parameters.len(), i, "parameter");
    }
    if let Some(name) = parameter.as_str() {
        return device
            .parameters
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| FacadeError::not_found(format!("no parameter named '{}'", name)));
    }
    Err(FacadeError::bad_value(
        "parameter must be an index or a name".to_string(),
    ))
}

/// Case-insensitive name matching (§4.4): `contains` / `startswith` / `equals`.
/// An empty or absent pattern matches everything.
pub fn name_matches(name: &str, pattern: Option<&str>, mode: &str) -> bool {
    let pattern = match pattern {
        Some(p) if !p.is_empty() => p,
        _ => return true,
    };
    let hay = name.to_lowercase();
    let needle = pattern.to_lowercase();
    match mode {
        "equals" => hay == needle,
        "startswith" => hay.starts_with(&needle),
        _ => hay.contains(&needle),
    }
}

/// Resolve a routing option (§4.4): `target` may be an index into
/// `options`, a case-insensitive substring matched against each
/// option, or absent (no change). Never throws.
pub fn resolve_option<'a>(options: &'a [String], target: Option<&Value>) -> Option<&'a str> {
    let target = target?;
    if target.is_null() {
        return None;
    }
    if let Some(i) = target.as_i64() {
        if i >= 0 && (i as usize) < options.len() {
            return Some(options[i as usize].as_str());
        }
        return None;
    }
    if let Some(s) = target.as_str() {
        let needle = s.to_lowercase();
        return options
            .iter()
            .find(|opt| opt.to_lowercase().contains(&needle))
            .map(|opt| opt.as_str());
    }
    None
}

/// Normalize a parsed [`ParamValue`] against one parameter's range
/// (§4.4). Always clamps to `[min, max]`; rounds to the nearest
/// integer when the parameter is quantized.
pub fn normalize(param: &Parameter, value: ParamValue) -> Result<f64, FacadeError> {
    let raw = match value {
        ParamValue::Number(n) => n,
        ParamValue::BareNumeric(n) => n,
        ParamValue::Decibels(n) => n,
        ParamValue::Min => param.min,
        ParamValue::Max => param.max,
        ParamValue::Percent(p) => param.min + (p / 100.0) * (param.max - param.min),
        ParamValue::Label(label) => {
            let items = param.value_items.as_ref().ok_or_else(|| {
                FacadeError::bad_value(format!("'{}' is not a valid value for {}", label, param.name))
            })?;
            let idx = items
                .iter()
                .position(|item| item.eq_ignore_ascii_case(&label))
                .ok_or_else(|| {
                    FacadeError::bad_value(format!(
                        "'{}' does not match any value item of {}",
                        label, param.name
                    ))
                })?;
            idx as f64
        }
    };

    let clamped = raw.clamp(param.min, param.max);
    Ok(if param.is_quantized {
        clamped.round()
    } else {
        clamped
    })
}

/// Parse a JSON `value` and normalize it against `param` in one step.
pub fn normalize_json(param: &Parameter, value: &Value) -> Result<f64, FacadeError> {
    let parsed = ParamValue::from_json(value).ok_or_else(|| {
        FacadeError::bad_value(format!("value {} is not a valid parameter value", value))
    })?;
    normalize(param, parsed)
}

const MIN_NOTE_DURATION: f64 = 0.01;

/// Clamp a note's pitch/velocity to their legal ranges and enforce the
/// minimum note duration (§3 invariants).
pub fn clamp_note(note: &mut Note) {
    note.pitch = note.pitch.min(127);
    note.velocity = note.velocity.min(127);
    if note.duration < MIN_NOTE_DURATION {
        note.duration = MIN_NOTE_DURATION;
    }
    if note.start_time < 0.0 {
        note.start_time = 0.0;
    }
}

/// Parse a JSON array of note objects into [`Note`]s, clamping each
/// one per the invariants in §3.
pub fn notes_from_json(value: &Value) -> Result<Vec<Note>, FacadeError> {
    let array = value
        .as_array()
        .ok_or_else(|| FacadeError::bad_value("notes must be a JSON array".to_string()))?;
    let mut notes = Vec::with_capacity(array.len());
    for entry in array {
        let mut note: Note = serde_json::from_value(entry.clone())
            .map_err(|e| FacadeError::bad_value(format!("invalid note: {}", e)))?;
        clamp_note(&mut note);
        notes.push(note);
    }
    Ok(notes)
}

pub fn monitor_from_str(s: &str) -> Option<Monitor> {
    match s.to_lowercase().as_str() {
        "in" => Some(Monitor::In),
        "auto" => Some(Monitor::Auto),
        "off" => Some(Monitor::Off),
        _ => None,
    }
}

pub fn monitor_to_str(m: Monitor) -> &'static str {
    match m {
        Monitor::In => "in",
        Monitor::Auto => "auto",
        Monitor::Off => "off",
    }
}

pub fn device_kind_str(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::Instrument => "instrument",
        DeviceKind::AudioEffect => "audio_effect",
        DeviceKind::MidiEffect => "midi_effect",
        DeviceKind::Rack => "rack",
        DeviceKind::DrumMachine => "drum_machine",
        DeviceKind::Unknown => "unknown",
    }
}

const FIND_BY_URI_DEPTH_CAP: usize = 10;
const LIST_SEARCH_DEPTH_CAP: usize = 4;

impl LiveSet {
    /// Depth-bounded recursive scan for a browser node by its opaque
    /// `uri` (§4.4). Depth cap 10.
    pub fn find_by_uri(&self, uri: &str) -> Option<&BrowserNode> {
        fn walk<'a>(node: &'a BrowserNode, uri: &str, depth: usize) -> Option<&'a BrowserNode> {
            if depth > FIND_BY_URI_DEPTH_CAP {
                return None;
            }
            if node.uri == uri {
                return Some(node);
            }
            node.children.iter().find_map(|c| walk(c, uri, depth + 1))
        }
        walk(&self.browser, uri, 0)
    }

    /// Resolve a slash-separated, case-insensitive path from the
    /// browser root, e.g. `"instruments/Simpler"`.
    pub fn find_by_path(&self, path: &str) -> Option<&BrowserNode> {
        let mut current = &self.browser;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .children
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(segment))?;
        }
        Some(current)
    }

    /// Children of the node addressed by a slash-separated path, or
    /// the root's children when `path` is empty.
    pub fn items_at_path(&self, path: &str) -> Option<&[BrowserNode]> {
        if path.is_empty() {
            Some(&self.browser.children)
        } else {
            self.find_by_path(path).map(|n| n.children.as_slice())
        }
    }

    /// Best-effort search, rooted at the `samples` category, for a
    /// browser node whose filename stem matches `stem` (case-insensitive).
    pub fn find_sample_uri_by_stem(&self, stem: &str) -> Option<String> {
        let samples = self.find_by_path("samples")?;
        let needle = stem.to_lowercase();
        fn walk(node: &BrowserNode, needle: &str) -> Option<String> {
            let name_stem = node
                .name
                .rsplit_once('.')
                .map(|(stem, _)| stem)
                .unwrap_or(&node.name)
                .to_lowercase();
            if node.is_loadable && name_stem == needle {
                return Some(node.uri.clone());
            }
            node.children.iter().find_map(|c| walk(c, needle))
        }
        walk(
            &BrowserNode {
                name: samples.name.clone(),
                uri: samples.uri.clone(),
                is_folder: samples.is_folder,
                is_device: samples.is_device,
                is_loadable: samples.is_loadable,
                children: samples.children.clone(),
            },
            &needle,
        )
    }

    /// BFS over loadable devices under `category` (or every category
    /// when absent), depth cap 4, stopping once `max_items` are found.
    pub fn list_loadable_devices(&self, category: Option<&str>, max_items: usize) -> Vec<&BrowserNode> {
        let mut out = Vec::new();
        let roots: Vec<&BrowserNode> = match category.filter(|c| !c.eq_ignore_ascii_case("all")) {
            Some(cat) => self
                .browser
                .children
                .iter()
                .filter(|c| c.name.eq_ignore_ascii_case(cat))
                .collect(),
            None => self.browser.children.iter().collect(),
        };
        let mut queue: std::collections::VecDeque<(&BrowserNode, usize)> =
            roots.into_iter().map(|r| (r, 0)).collect();
        while let Some((node, depth)) = queue.pop_front() {
            if out.len() >= max_items {
                break;
            }
            if node.is_loadable {
                out.push(node);
            }
            if depth < LIST_SEARCH_DEPTH_CAP {
                for child in &node.children {
                    queue.push_back((child, depth + 1));
                }
            }
        }
        out
    }

    /// Same traversal as [`LiveSet::list_loadable_devices`], filtered
    /// by a case-insensitive substring of the device name.
    pub fn search_loadable_devices(
        &self,
        query: &str,
        category: Option<&str>,
        max_items: usize,
    ) -> Vec<&BrowserNode> {
        let needle = query.to_lowercase();
        self.list_loadable_devices(category, usize::MAX)
            .into_iter()
            .filter(|n| n.name.to_lowercase().contains(&needle))
            .take(max_items)
            .collect()
    }
}
