//! Slack Integration - slash command surface
//!
//! This crate provides the Slack side of happytaps:
//! - **Slash Commands** (`commands`) - `/happytaps [location]` form payloads
//! - **Block Kit** (`blocks`) - header/context/image/section messages per outcome
//! - **Response URL** (`response_url`) - delayed reply through the command's `response_url`
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Add the `/happytaps` slash command pointing at `POST /slack/commands`
//! 3. Set `HAPPYTAPS_DIRECTORY_API_KEY` (or `YELP_API_KEY`) and start the server
//!
//! # Architecture
//!
//! ```text
//! Slack → /slack/commands → parse_find_command → ack (ephemeral)
//!                                   ↓
//!                        TapFinder::find → ResponseUrlDispatcher → response_url
//! ```
//!
//! # Key Types
//!
//! - `SlashCommandPayload` - the form body Slack posts
//! - `MessageBuilder` - constructs Block Kit messages
//! - `ResponseUrlDispatcher` - `ResponseDispatcher` backed by a Slack response URL

pub mod blocks;
pub mod commands;
pub mod response_url;

pub use commands::{parse_find_command, CommandParseError, FindCommand, SlashCommandPayload};
pub use response_url::ResponseUrlDispatcher;
