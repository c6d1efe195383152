//! Command tags embedded in orchestrator replies.
//!
//! The orchestrator answers in free text and may append tags such as
//! `[VIEW:CAD]` or `[ACTION:RUN_MESH]`. Tags are stripped from the text the
//! user sees and handed to the workspace in the order they appeared.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(VIEW|ACTION):([A-Z_]+)\]").expect("command tag pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    View,
    Action,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::View => "VIEW",
            CommandKind::Action => "ACTION",
        }
    }
}

/// What a tag asks the workspace to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    ShowStyling,
    ShowGeometry,
    ShowMeshing,
    ShowSimulation,
    /// Styling view, selection cleared
    GenerateImages,
    /// Geometry view, default design selected when nothing is
    RetrieveCad,
    /// Meshing view, log stream for the selected design
    RunMesh,
    RunCfd,
    /// Well-formed but unrecognized; ignored
    Unknown,
}

/// A well-formed `[KIND:NAME]` tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandToken {
    pub kind: CommandKind,
    pub name: String,
}

impl CommandToken {
    pub fn new(kind: CommandKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn view(name: &str) -> Self {
        Self::new(CommandKind::View, name)
    }

    pub fn action(name: &str) -> Self {
        Self::new(CommandKind::Action, name)
    }

    pub fn directive(&self) -> Directive {
        match (self.kind, self.name.as_str()) {
            (CommandKind::View, "STYLING") => Directive::ShowStyling,
            (CommandKind::View, "CAD") => Directive::ShowGeometry,
            (CommandKind::View, "MESHING") => Directive::ShowMeshing,
            (CommandKind::View, "CFD") => Directive::ShowSimulation,
            (CommandKind::Action, "GENERATE_IMAGES") => Directive::GenerateImages,
            (CommandKind::Action, "RETRIEVE_CAD") => Directive::RetrieveCad,
            (CommandKind::Action, "RUN_MESH") => Directive::RunMesh,
            (CommandKind::Action, "RUN_CFD") => Directive::RunCfd,
            _ => Directive::Unknown,
        }
    }
}

impl fmt::Display for CommandToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.kind.as_str(), self.name)
    }
}

/// Reply split into what the user reads and what the UI does
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedReply {
    pub text: String,
    pub commands: Vec<CommandToken>,
}

/// Extract every tag left to right, duplicates included, and strip them from the text
pub fn parse_reply(raw: &str) -> ParsedReply {
    let commands = COMMAND_RE
        .captures_iter(raw)
        .map(|cap| {
            let kind = if &cap[1] == "VIEW" {
                CommandKind::View
            } else {
                CommandKind::Action
            };
            CommandToken::new(kind, &cap[2])
        })
        .collect::<Vec<_>>();

    let text = COMMAND_RE.replace_all(raw, "").trim().to_string();
    if !commands.is_empty() {
        tracing::debug!(count = commands.len(), "parsed command tags");
    }
    ParsedReply { text, commands }
}

/// Offline guess at the view the user wants, from their own message.
/// At most one tag; first keyword hit wins.
pub fn fallback_commands(user_message: &str) -> Vec<CommandToken> {
    const KEYWORDS: [(&str, &str); 4] = [
        ("style", "STYLING"),
        ("cad", "CAD"),
        ("mesh", "MESHING"),
        ("sim", "CFD"),
    ];
    let lowered = user_message.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, view)| vec![CommandToken::view(view)])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_tags_returns_trimmed_text() {
        let parsed = parse_reply("  请先选择一个设计。 \n");
        assert_eq!(parsed.text, "请先选择一个设计。");
        assert!(parsed.commands.is_empty());
    }

    #[test]
    fn test_tags_extracted_in_order_with_duplicates() {
        let parsed = parse_reply("a[VIEW:CAD]b [ACTION:RUN_MESH] c[VIEW:CAD]");
        assert_eq!(
            parsed.commands,
            vec![
                CommandToken::view("CAD"),
                CommandToken::action("RUN_MESH"),
                CommandToken::view("CAD"),
            ]
        );
        assert_eq!(parsed.text, "ab  c");
    }

    #[test]
    fn test_malformed_brackets_are_inert() {
        let raw = "[FOO] [view:cad] [VIEW:cad] [VIEW:] [OTHER:CAD] [VIEW:CAD1]";
        let parsed = parse_reply(raw);
        assert!(parsed.commands.is_empty());
        assert_eq!(parsed.text, raw);
    }

    #[test]
    fn test_styling_scenario() {
        let parsed = parse_reply("好的 [VIEW:STYLING] [ACTION:GENERATE_IMAGES]");
        assert_eq!(parsed.text, "好的");
        assert_eq!(
            parsed.commands,
            vec![
                CommandToken::view("STYLING"),
                CommandToken::action("GENERATE_IMAGES"),
            ]
        );
    }

    #[test]
    fn test_unknown_well_formed_token() {
        let parsed = parse_reply("[ACTION:SELF_DESTRUCT]");
        assert_eq!(parsed.commands.len(), 1);
        assert_eq!(parsed.commands[0].directive(), Directive::Unknown);
        assert_eq!(parsed.text, "");
    }

    #[test]
    fn test_directive_table() {
        assert_eq!(CommandToken::view("STYLING").directive(), Directive::ShowStyling);
        assert_eq!(CommandToken::view("CFD").directive(), Directive::ShowSimulation);
        assert_eq!(CommandToken::action("RUN_CFD").directive(), Directive::RunCfd);
        // kinds are not interchangeable
        assert_eq!(CommandToken::action("CAD").directive(), Directive::Unknown);
    }

    #[test]
    fn test_display_round_trips_tag_text() {
        assert_eq!(CommandToken::action("RETRIEVE_CAD").to_string(), "[ACTION:RETRIEVE_CAD]");
    }

    #[test]
    fn test_fallback_keyword_order() {
        assert_eq!(fallback_commands("Show me STYLE options"), vec![CommandToken::view("STYLING")]);
        // "style" beats "mesh" even when mesh comes first in the text
        assert_eq!(fallback_commands("mesh the style"), vec![CommandToken::view("STYLING")]);
        assert_eq!(fallback_commands("open the CAD model"), vec![CommandToken::view("CAD")]);
        assert_eq!(fallback_commands("run mesh"), vec![CommandToken::view("MESHING")]);
        assert_eq!(fallback_commands("simulate"), vec![CommandToken::view("CFD")]);
        assert!(fallback_commands("你好").is_empty());
    }
}
