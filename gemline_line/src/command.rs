/// Text commands recognised in any mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Activate,
    Stop,
    Reset,
}

impl Command {
    pub const ACTIVATE_KEYWORD: &'static str = "gemini";
    pub const STOP_PHRASES: [&'static str; 2] = ["結束gemini", "結束 gemini"];
    pub const RESET_PHRASES: [&'static str; 2] = ["清除記憶", "reset memory"];

    /// Match trimmed `text` case-insensitively against the command phrases.
    #[must_use]
    pub fn parse_from_text(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();

        if Self::STOP_PHRASES.contains(&text.as_str()) {
            Some(Self::Stop)
        } else if text == Self::ACTIVATE_KEYWORD {
            Some(Self::Activate)
        } else if Self::RESET_PHRASES.contains(&text.as_str()) {
            Some(Self::Reset)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn activated_text() -> &'static str {
        "已轉接到Gemini AI服務"
    }

    /// Sent instead of the personalised push when the profile is unavailable.
    #[must_use]
    pub const fn generic_greeting_text() -> &'static str {
        "已轉接到Gemini AI服務，你好！"
    }

    #[must_use]
    pub fn greeting_text(display_name: &str) -> String {
        format!("{display_name} 你好")
    }

    #[must_use]
    pub const fn stopped_text() -> &'static str {
        "結束Gemini AI服務"
    }

    #[must_use]
    pub const fn reset_text() -> &'static str {
        "已清除對話記憶"
    }

    /// Reply when the assistant branch fails outright.
    #[must_use]
    pub const fn unavailable_text() -> &'static str {
        "抱歉，我現在無法處理你的請求。"
    }
}
