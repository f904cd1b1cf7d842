//! Handler implementations grouped by area (§4.5). Every function here
//! shares the signature [`crate::registry::HandlerFn`]; the registry is
//! the only thing that knows these modules exist.

pub mod browser;
pub mod clip;
pub mod device;
pub mod pattern;
pub mod playback;
pub mod scene;
pub mod session;
pub mod test_midi;
pub mod track;
