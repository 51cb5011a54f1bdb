//! Scripted snap-move sessions: a JSON list of raw input events replayed
//! against a scene.

use glam::DVec3;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use snapmove_core::geometry::{Axis, MovingSelection};
use snapmove_core::index::BuildSummary;
use snapmove_core::input::{Dispatch, InputEvent, InputTranslator, KeyEvent, MouseButton, PointerEvent};
use snapmove_core::session::{SessionError, SessionPhase, SnapEvent, SnapSession};
use snapmove_core::{Camera, Scene, SnapConfig};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Script loading and replay errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Script parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Scene has no object named '{0}'")]
    UnknownObject(String),
    #[error("Session failed to start: {0}")]
    Session(#[from] SessionError),
}

/// Result type for script operations.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// One recorded input step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptEvent {
    PointerMove { x: f64, y: f64 },
    ButtonDown { button: MouseButton, x: f64, y: f64 },
    ButtonUp { button: MouseButton, x: f64, y: f64 },
    Scroll { x: f64, y: f64, delta: f64 },
    Key {
        key: String,
        #[serde(default)]
        shift: bool,
    },
    /// Toggle alignment search on one axis (a panel toggle, not a key).
    ToggleAlign { axis: Axis },
}

/// A move to replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Name of the object to move.
    pub moving: String,
    /// Vertex indices to move instead of the whole object.
    #[serde(default)]
    pub vertices: Option<Vec<usize>>,
    #[serde(default)]
    pub camera: Camera,
    /// Pointer position when the move starts.
    pub start: [f64; 2],
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

impl Script {
    pub fn from_json(json: &str) -> ScriptResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> ScriptResult<Self> {
        let json = fs::read_to_string(path)?;
        let script = Self::from_json(&json)?;
        log::info!("Loaded script with {} events from {:?}", script.events.len(), path);
        Ok(script)
    }
}

/// Status after one event the session handled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    /// Position of the event in the script.
    pub step: usize,
    pub status: String,
    pub applied: DVec3,
    pub hard_snap: bool,
}

/// Outcome of a replayed script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub summary: BuildSummary,
    pub ticks: Vec<Tick>,
    /// `Active` when the script ended without confirming or cancelling.
    pub phase: SessionPhase,
    pub final_position: DVec3,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary)?;
        for tick in &self.ticks {
            let hard = if tick.hard_snap { " [hard]" } else { "" };
            writeln!(f, "#{:<4} {}{}", tick.step, tick.status, hard)?;
        }
        write!(
            f,
            "{:?} at ({:.3}, {:.3}, {:.3})",
            self.phase, self.final_position.x, self.final_position.y, self.final_position.z
        )
    }
}

fn to_input(event: &ScriptEvent) -> Option<InputEvent> {
    let input = match event {
        ScriptEvent::PointerMove { x, y } => InputEvent::Pointer(PointerEvent::Move {
            position: Point::new(*x, *y),
        }),
        ScriptEvent::ButtonDown { button, x, y } => InputEvent::Pointer(PointerEvent::Down {
            position: Point::new(*x, *y),
            button: *button,
        }),
        ScriptEvent::ButtonUp { button, x, y } => InputEvent::Pointer(PointerEvent::Up {
            position: Point::new(*x, *y),
            button: *button,
        }),
        ScriptEvent::Scroll { x, y, delta } => InputEvent::Pointer(PointerEvent::Scroll {
            position: Point::new(*x, *y),
            delta: Vec2::new(0.0, *delta),
        }),
        ScriptEvent::Key { key, .. } => InputEvent::Key(KeyEvent::Pressed(key.clone())),
        ScriptEvent::ToggleAlign { .. } => return None,
    };
    Some(input)
}

/// Replay `script` against `scene`, mutating it like an interactive move would.
pub fn run(scene: &mut Scene, config: &SnapConfig, script: &Script) -> ScriptResult<Report> {
    let object = scene
        .find_by_name(&script.moving)
        .ok_or_else(|| ScriptError::UnknownObject(script.moving.clone()))?;
    let selection = match &script.vertices {
        Some(indices) => MovingSelection::vertices(object.id, indices.iter().copied()),
        None => MovingSelection::whole(object.id),
    };

    let start = Point::new(script.start[0], script.start[1]);
    let mut session = SnapSession::start(&*scene, Some(selection), start, script.camera.clone(), config)?;
    let mut translator = InputTranslator::new();
    let mut ticks = Vec::new();

    for (step, event) in script.events.iter().enumerate() {
        let dispatch = match event {
            ScriptEvent::ToggleAlign { axis } => Dispatch::Session(SnapEvent::ToggleAlignAxis(*axis)),
            ScriptEvent::Key { shift, .. } => {
                translator.modifiers.shift = *shift;
                to_input(event).map_or(Dispatch::Consumed, |input| translator.translate(&input))
            }
            _ => to_input(event).map_or(Dispatch::Consumed, |input| translator.translate(&input)),
        };

        let Dispatch::Session(snap_event) = dispatch else {
            log::debug!("step {}: {:?}", step, dispatch);
            continue;
        };
        let phase = session.handle_event(snap_event, &mut *scene);
        ticks.push(Tick {
            step,
            status: session.status().to_string(),
            applied: session.applied(),
            hard_snap: session.hard_snap(),
        });
        if phase.is_finished() {
            if step + 1 < script.events.len() {
                log::info!("Session finished at step {}, ignoring {} events", step, script.events.len() - step - 1);
            }
            break;
        }
    }

    Ok(Report {
        summary: session.summary().clone(),
        ticks,
        phase: session.phase(),
        final_position: session.applied(),
    })
}
