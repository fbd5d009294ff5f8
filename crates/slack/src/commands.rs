use serde::Deserialize;
use thiserror::Error;

use happytaps_core::FindRequest;

/// Form body of a Slack slash command invocation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SlashCommandPayload {
    pub command: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub response_url: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub trigger_id: String,
}

/// A validated find command, ready to hand to the finder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FindCommand {
    /// Trimmed location text; `None` when the user typed nothing.
    pub location: Option<String>,
    pub response_url: String,
    pub channel_id: String,
    pub user_id: String,
}

impl FindCommand {
    pub fn into_request(self, correlation_id: impl Into<String>) -> FindRequest {
        FindRequest::new(self.location, correlation_id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unsupported slash command: {0}")]
    UnsupportedCommand(String),
    #[error("slash command payload has no response_url")]
    MissingResponseUrl,
}

pub fn parse_find_command(
    payload: SlashCommandPayload,
    expected_command: &str,
) -> Result<FindCommand, CommandParseError> {
    if !payload.command.trim().eq_ignore_ascii_case(expected_command) {
        return Err(CommandParseError::UnsupportedCommand(payload.command));
    }

    let response_url = payload.response_url.trim();
    if response_url.is_empty() {
        return Err(CommandParseError::MissingResponseUrl);
    }

    let text = payload.text.trim();
    let location = (!text.is_empty()).then(|| text.to_owned());

    Ok(FindCommand {
        location,
        response_url: response_url.to_owned(),
        channel_id: payload.channel_id,
        user_id: payload.user_id,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_find_command, CommandParseError, SlashCommandPayload};

    fn payload(command: &str, text: &str) -> SlashCommandPayload {
        SlashCommandPayload {
            command: command.to_owned(),
            text: text.to_owned(),
            response_url: "https://hooks.slack.test/commands/T1/1/abc".to_owned(),
            channel_id: "C1".to_owned(),
            user_id: "U1".to_owned(),
            team_id: "T1".to_owned(),
            trigger_id: "trigger".to_owned(),
        }
    }

    #[test]
    fn location_text_is_trimmed() {
        let command = parse_find_command(payload("/happytaps", "  Austin, TX "), "/happytaps")
            .expect("parse command");

        assert_eq!(command.location.as_deref(), Some("Austin, TX"));
        assert_eq!(command.channel_id, "C1");
        assert_eq!(command.response_url, "https://hooks.slack.test/commands/T1/1/abc");
    }

    #[test]
    fn blank_text_leaves_location_unset() {
        let command =
            parse_find_command(payload("/happytaps", "   "), "/happytaps").expect("parse command");

        assert_eq!(command.location, None);
        let request = command.into_request("req-1");
        assert_eq!(request.location, None);
        assert_eq!(request.correlation_id, "req-1");
    }

    #[test]
    fn other_commands_are_rejected() {
        let error = parse_find_command(payload("/weather", "new"), "/happytaps")
            .expect_err("foreign command should be rejected");

        assert_eq!(error, CommandParseError::UnsupportedCommand("/weather".to_owned()));
    }

    #[test]
    fn missing_response_url_is_rejected() {
        let mut without_url = payload("/happytaps", "Austin");
        without_url.response_url = String::new();

        assert_eq!(
            parse_find_command(without_url, "/happytaps"),
            Err(CommandParseError::MissingResponseUrl)
        );
    }

    #[test]
    fn payload_deserializes_with_optional_fields_missing() {
        let payload: SlashCommandPayload = serde_json::from_value(serde_json::json!({
            "command": "/happytaps",
            "response_url": "https://hooks.slack.test/x"
        }))
        .expect("deserialize payload");

        assert_eq!(payload.text, "");
        assert_eq!(payload.trigger_id, "");
    }
}
