//! Key bindings active during a snap move, for display.

/// A binding of one input to a session action.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub input: &'static str,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(input: &'static str, shift: bool, description: &'static str) -> Self {
        Self {
            input,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Shift+X").
    pub fn format(&self) -> String {
        if self.shift {
            format!("Shift+{}", self.input)
        } else {
            self.input.to_string()
        }
    }
}

/// Registry of the snap-move bindings.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Mouse Move", false, "Move and search for snap targets"),
            Shortcut::new("Left Click", false, "Confirm"),
            Shortcut::new("Enter", false, "Confirm"),
            Shortcut::new("Numpad Enter", false, "Confirm"),
            Shortcut::new("Escape", false, "Cancel and restore"),
            Shortcut::new("Right Mouse (hold)", false, "Hard snap to the target"),
            Shortcut::new("X", false, "Constrain to X axis"),
            Shortcut::new("Y", false, "Constrain to Y axis"),
            Shortcut::new("Z", false, "Constrain to Z axis"),
            Shortcut::new("X", true, "Constrain to YZ plane"),
            Shortcut::new("Y", true, "Constrain to XZ plane"),
            Shortcut::new("Z", true, "Constrain to XY plane"),
            Shortcut::new("Middle Mouse / Wheel", false, "Navigate the view"),
        ]
    }

    /// Render the table as text.
    pub fn table() -> String {
        let mut out = String::from("=== Snap Move Shortcuts ===\n");
        for shortcut in Self::all() {
            out.push_str(&format!("  {:22} {}\n", shortcut.format(), shortcut.description));
        }
        out
    }

    /// Print all shortcuts to console.
    pub fn print_all() {
        println!("\n{}", Self::table());
    }
}
