//! Handler Registry (§4.5): the single lookup table mapping a request's
//! `type` string to a handler function and whether the Command
//! Dispatcher must hop it through the Thread Bridge.
//!
//! Grounded the same way the reference workspace's dispatch layer keys
//! a flat action table by string (`imbolc-core/src/dispatch/mod.rs`),
//! generalized here to also carry the main-thread requirement the
//! Dispatcher needs per §4.6.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::FacadeError;
use crate::handlers::{browser, clip, device, pattern, playback, scene, session, test_midi, track};
use crate::state::LiveSet;

/// Every handler shares this shape: params in, a JSON result or a
/// typed façade error out. No handler owns a `LiveSet` — it borrows one
/// for the duration of the call.
pub type HandlerFn = fn(&HashMap<String, Value>, &mut LiveSet) -> Result<Value, FacadeError>;

#[derive(Clone, Copy)]
pub struct HandlerEntry {
    pub handler: HandlerFn,
    /// `true` when the Dispatcher must route the call through
    /// `ThreadBridge::run_on_main` rather than invoking it directly
    /// (§4.6 step 4-5). Read-only, side-effect-free lookups are the
    /// only handlers marked `false`.
    pub requires_main_thread: bool,
}

pub struct Registry {
    entries: HashMap<&'static str, HandlerEntry>,
}

macro_rules! entry {
    ($map:expr, $name:literal, $handler:expr, $requires_main_thread:expr) => {
        $map.insert(
            $name,
            HandlerEntry {
                handler: $handler,
                requires_main_thread: $requires_main_thread,
            },
        );
    };
}

impl Registry {
    pub fn with_defaults() -> Self {
        let mut entries: HashMap<&'static str, HandlerEntry> = HashMap::new();

        // Session / transport
        entry!(entries, "get_session_info", session::get_session_info, false);
        entry!(entries, "set_tempo", session::set_tempo, true);
        entry!(entries, "set_time_signature", session::set_time_signature, true);
        entry!(entries, "start_playback", session::start_playback, true);
        entry!(entries, "stop_playback", session::stop_playback, true);
        entry!(entries, "get_song_context", session::get_song_context, false);
        entry!(entries, "set_record_mode", session::set_record_mode, true);
        entry!(entries, "trigger_session_record", session::trigger_session_record, true);
        entry!(entries, "capture_midi", session::capture_midi, true);
        entry!(entries, "set_overdub", session::set_overdub, true);

        // Track CRUD & mixer
        entry!(entries, "get_track_info", track::get_track_info, false);
        entry!(entries, "create_midi_track", track::create_midi_track, true);
        entry!(entries, "create_audio_track", track::create_audio_track, true);
        entry!(entries, "delete_track", track::delete_track, true);
        entry!(entries, "duplicate_track", track::duplicate_track, true);
        entry!(entries, "set_track_name", track::set_track_name, true);
        entry!(entries, "set_track_volume", track::set_track_volume, true);
        entry!(entries, "set_track_panning", track::set_track_panning, true);
        entry!(entries, "set_track_mute", track::set_track_mute, true);
        entry!(entries, "set_track_solo", track::set_track_solo, true);
        entry!(entries, "set_track_arm", track::set_track_arm, true);
        entry!(entries, "set_send_level", track::set_send_level, true);
        entry!(entries, "configure_track_routing", track::configure_track_routing, true);

        // Return tracks
        entry!(entries, "create_return_track", track::create_return_track, true);
        entry!(entries, "delete_return_track", track::delete_return_track, true);
        entry!(entries, "set_return_track_name", track::set_return_track_name, true);

        // Scene CRUD & launch
        entry!(entries, "create_scene", scene::create_scene, true);
        entry!(entries, "delete_scene", scene::delete_scene, true);
        entry!(entries, "duplicate_scene", scene::duplicate_scene, true);
        entry!(entries, "fire_scene", scene::fire_scene, true);
        entry!(entries, "stop_scene", scene::stop_scene, true);
        entry!(entries, "fire_scene_by_name", scene::fire_scene_by_name, true);

        // Clip CRUD & MIDI edit
        entry!(entries, "create_clip", clip::create_clip, true);
        entry!(entries, "delete_clip", clip::delete_clip, true);
        entry!(entries, "duplicate_clip", clip::duplicate_clip, true);
        entry!(entries, "add_notes_to_clip", clip::add_notes_to_clip, true);
        entry!(entries, "set_clip_name", clip::set_clip_name, true);
        entry!(entries, "set_clip_loop", clip::set_clip_loop, true);
        entry!(entries, "set_clip_length", clip::set_clip_length, true);
        entry!(entries, "quantize_clip", clip::quantize_clip, true);
        entry!(entries, "list_clips", clip::list_clips, false);

        // Playback
        entry!(entries, "fire_clip", playback::fire_clip, true);
        entry!(entries, "stop_clip", playback::stop_clip, true);
        entry!(entries, "fire_clip_by_name", playback::fire_clip_by_name, true);

        // Test MIDI
        entry!(entries, "trigger_test_midi", test_midi::trigger_test_midi, true);

        // Devices & parameters
        entry!(entries, "load_browser_item", device::load_browser_item, true);
        entry!(entries, "load_device", device::load_device, true);
        entry!(entries, "load_simpler_with_sample", device::load_simpler_with_sample, true);
        entry!(entries, "load_sampler_with_sample", device::load_sampler_with_sample, true);
        entry!(entries, "get_device_parameters", device::get_device_parameters, false);
        entry!(entries, "set_device_parameter", device::set_device_parameter, true);
        entry!(entries, "set_device_parameters", device::set_device_parameters, true);
        entry!(entries, "save_device_snapshot", device::save_device_snapshot, false);
        entry!(entries, "apply_device_snapshot", device::apply_device_snapshot, true);
        entry!(entries, "set_device_sidechain_source", device::set_device_sidechain_source, true);
        entry!(entries, "set_device_audio_input", device::set_device_audio_input, true);
        entry!(entries, "list_routable_devices", device::list_routable_devices, false);

        // Browser introspection
        entry!(entries, "get_browser_item", browser::get_browser_item, false);
        entry!(entries, "get_browser_tree", browser::get_browser_tree, false);
        entry!(entries, "get_browser_items_at_path", browser::get_browser_items_at_path, false);
        entry!(entries, "list_loadable_devices", browser::list_loadable_devices, false);
        entry!(entries, "search_loadable_devices", browser::search_loadable_devices, false);

        // Pattern helpers
        entry!(entries, "add_basic_drum_pattern", pattern::add_basic_drum_pattern, true);
        entry!(entries, "add_chord_stack", pattern::add_chord_stack, true);

        Self { entries }
    }

    pub fn lookup(&self, request_type: &str) -> Option<&HandlerEntry> {
        self.entries.get(request_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_known_handler() {
        let registry = Registry::with_defaults();
        let entry = registry.lookup("get_session_info").expect("registered");
        assert!(!entry.requires_main_thread);
    }

    #[test]
    fn unknown_type_string_is_absent() {
        let registry = Registry::with_defaults();
        assert!(registry.lookup("not_a_real_command").is_none());
    }

    #[test]
    fn mutating_handlers_require_main_thread() {
        let registry = Registry::with_defaults();
        let entry = registry.lookup("create_midi_track").expect("registered");
        assert!(entry.requires_main_thread);
    }

    #[test]
    fn registers_every_documented_handler() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.len(), 64);
    }
}
