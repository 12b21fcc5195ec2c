#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

/// Commands whose whole remainder is taken verbatim.
pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "text_model",
        action: "set_text_model",
    },
    CommandSpec {
        command: "image_model",
        action: "set_image_model",
    },
    CommandSpec {
        command: "explain",
        action: "explain",
    },
];

/// Commands taking one path or URL, shell-quoted when it contains spaces.
pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "use",
        action: "use_image",
    },
    CommandSpec {
        command: "export",
        action: "export",
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "history",
        action: "history",
    },
    CommandSpec {
        command: "reset",
        action: "reset",
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/help",
    "/text_model",
    "/image_model",
    "/explain",
    "/use",
    "/history",
    "/reset",
    "/export",
];
