use super::command_registry::{
    CommandSpec, NO_ARG_COMMANDS, RAW_ARG_COMMANDS, SINGLE_PATH_COMMANDS,
};

/// One line typed into the chat REPL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Noop,
    Help,
    History,
    Reset,
    SetTextModel(String),
    SetImageModel(String),
    Explain(String),
    UseImage(String),
    Export(String),
    Unknown { command: String, arg: String },
    /// Plain text: a conversation turn to be routed.
    Turn(String),
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_path_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg
            .split_whitespace()
            .map(str::to_string)
            .filter(|value| !value.is_empty())
            .collect(),
    }
}

fn parse_single_path_arg(arg: &str) -> String {
    let parts = parse_path_args(arg);
    match parts.len() {
        0 => String::new(),
        1 => parts[0].clone(),
        _ => parts.join(" "),
    }
}

pub fn parse_command(text: &str) -> ChatCommand {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return ChatCommand::Noop;
    }

    let Some(slash_tail) = raw_trimmed.strip_prefix('/') else {
        return ChatCommand::Turn(raw_trimmed.to_string());
    };
    let command_len = slash_tail
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .count();
    if command_len == 0 {
        return ChatCommand::Turn(raw_trimmed.to_string());
    }

    let command = slash_tail[..command_len].to_ascii_lowercase();
    let arg = slash_tail[command_len..].trim().to_string();

    if let Some(action) = find_action(&command, RAW_ARG_COMMANDS) {
        return match action {
            "set_text_model" => ChatCommand::SetTextModel(arg),
            "set_image_model" => ChatCommand::SetImageModel(arg),
            _ => ChatCommand::Explain(arg),
        };
    }

    if let Some(action) = find_action(&command, SINGLE_PATH_COMMANDS) {
        let path = parse_single_path_arg(&arg);
        return match action {
            "use_image" => ChatCommand::UseImage(path),
            _ => ChatCommand::Export(path),
        };
    }

    if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
        return match action {
            "history" => ChatCommand::History,
            "reset" => ChatCommand::Reset,
            _ => ChatCommand::Help,
        };
    }

    ChatCommand::Unknown { command, arg }
}
