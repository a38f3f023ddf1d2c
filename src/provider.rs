use strum::{AsRefStr, Display};

/// Model vendor as understood by the bot platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display)]
pub enum Provider {
    #[strum(serialize = "openai")]
    OpenAi,
    #[strum(serialize = "anthropic")]
    Anthropic,
    Unknown,
}

pub fn provider_for_model(model: &str) -> Provider {
    match model {
        "gpt-3.5-turbo" | "gpt-4" => Provider::OpenAi,
        "claude-1" | "claude-instant-1" => Provider::Anthropic,
        _ => Provider::Unknown,
    }
}
