//! SnapMove headless driver: replays scripted moves against a JSON scene.

pub mod script;
pub mod shortcuts;

pub use script::{Report, Script, ScriptError, ScriptEvent, run};
pub use shortcuts::ShortcutRegistry;
