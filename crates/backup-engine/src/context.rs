use core::fmt::Display;

/// Holds the context for the current operation. Used for prefixing logs.
#[derive(Default, Debug)]
pub struct Context {
    /// The game mode being operated on.
    pub game_mode: Option<String>,
    /// The save being operated on.
    pub save: Option<String>,
    /// The current step.
    pub current_context: &'static str,
}

impl Context {
    /// Create a context for a save in a game mode.
    pub fn for_save(game_mode: &str, save: &str) -> Self {
        Self {
            game_mode: Some(game_mode.to_string()),
            save: Some(save.to_string()),
            current_context: "",
        }
    }
}

impl Display for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match (&self.game_mode, &self.save) {
            (Some(mode), Some(save)) => write!(f, "[{mode}/{save}] ")?,
            (Some(mode), None) => write!(f, "[{mode}] ")?,
            (None, Some(save)) => write!(f, "[{save}] ")?,
            (None, None) => {}
        }

        if !self.current_context.is_empty() {
            write!(f, "[{}] ", self.current_context)?;
        }

        Ok(())
    }
}
