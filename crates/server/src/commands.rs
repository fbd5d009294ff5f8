use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Form, Json, Router};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};
use uuid::Uuid;

use happytaps_core::{ApplicationError, InterfaceError};
use happytaps_finder::{Delivery, TapFinder};
use happytaps_slack::blocks::{
    ack_message, unsupported_command_message, MessageBuilder, MessageTemplate,
};
use happytaps_slack::{
    parse_find_command, CommandParseError, ResponseUrlDispatcher, SlashCommandPayload,
};

/// Everything the slash command route needs; cheap to clone per request.
#[derive(Clone)]
pub struct CommandState {
    pub finder: Arc<TapFinder>,
    pub slack_http: reqwest::Client,
    pub command: String,
    pub ack_text: String,
    /// Tracks spawned finds so shutdown can drain them.
    pub tasks: TaskTracker,
    /// Cancelled once the drain window has elapsed.
    pub shutdown: CancellationToken,
}

pub fn router(state: CommandState) -> Router {
    Router::new().route("/slack/commands", post(slash_command)).with_state(state)
}

/// Acks within Slack's three second window and finishes the lookup on a background task that
/// replies through the command's `response_url`.
pub async fn slash_command(
    State(state): State<CommandState>,
    Form(payload): Form<SlashCommandPayload>,
) -> (StatusCode, Json<MessageTemplate>) {
    let correlation_id = Uuid::new_v4().to_string();

    let command = match parse_find_command(payload, &state.command) {
        Ok(command) => command,
        Err(CommandParseError::UnsupportedCommand(command)) => {
            let error = ApplicationError::UnsupportedCommand(command.clone())
                .into_interface(correlation_id.as_str());
            warn!(
                event_name = "slack.command.unsupported",
                correlation_id = %error.correlation_id(),
                error = %error,
                "ignoring slash command routed to the wrong app"
            );
            return (StatusCode::OK, Json(unsupported_command_message(&command)));
        }
        Err(CommandParseError::MissingResponseUrl) => {
            let error = InterfaceError::BadRequest {
                message: "missing response_url".to_owned(),
                correlation_id: correlation_id.clone(),
            };
            warn!(
                event_name = "slack.command.rejected",
                correlation_id = %correlation_id,
                error = %error,
                "slash command payload rejected"
            );
            let body = MessageBuilder::new(error.user_message()).ephemeral().build();
            return (StatusCode::BAD_REQUEST, Json(body));
        }
    };

    info!(
        event_name = "slack.command.accepted",
        correlation_id = %correlation_id,
        channel_id = %command.channel_id,
        user_id = %command.user_id,
        location = command.location.as_deref().unwrap_or(""),
        "slash command accepted"
    );

    let dispatcher = ResponseUrlDispatcher::new(state.slack_http.clone(), &command.response_url);
    let request = command
        .into_request(correlation_id.as_str())
        .with_cancellation(state.shutdown.child_token());
    let finder = Arc::clone(&state.finder);
    state.tasks.spawn(async move {
        let correlation_id = request.correlation_id.clone();
        match finder.find(request, &dispatcher).await {
            Ok(Delivery::Delivered(_)) => {}
            Ok(Delivery::Skipped) => info!(
                event_name = "slack.command.abandoned",
                correlation_id = %correlation_id,
                "server shut down before the reply was sent"
            ),
            Err(error) => {
                let error = ApplicationError::from(error).into_interface(correlation_id.as_str());
                warn!(
                    event_name = "slack.command.reply_failed",
                    correlation_id = %error.correlation_id(),
                    error = %error,
                    "delayed reply to slack failed"
                );
            }
        }
    });

    (StatusCode::OK, Json(ack_message(&state.ack_text)))
}
