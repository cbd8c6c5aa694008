use serde::{Deserialize, Serialize};

/// Per-user dispatch mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Replies repeat the inbound text.
    #[default]
    Echo,
    /// Replies come from the chat model.
    Assistant,
}

impl Mode {
    #[must_use]
    pub const fn from_assistant_flag(assistant_mode: bool) -> Self {
        if assistant_mode {
            Self::Assistant
        } else {
            Self::Echo
        }
    }

    #[must_use]
    pub const fn is_assistant(self) -> bool {
        matches!(self, Self::Assistant)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Echo => write!(f, "echo"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}
