use serde::Serialize;

use happytaps_core::{Business, DeliveryPayload, DeliveryStatus};

const IMAGE_ALT_TEXT: &str = "happy hour pic";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    InChannel,
    Ephemeral,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { block_id: String, text: TextObject },
    Context { block_id: String, elements: Vec<TextObject> },
    Image { block_id: String, image_url: String, alt_text: String },
    Section { block_id: String, text: TextObject },
}

/// A message body as Slack expects it on a response URL or as a command ack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub response_type: ResponseType,
    #[serde(rename = "text")]
    pub fallback_text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    response_type: ResponseType,
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            fallback_text: fallback_text.into(),
            blocks: Vec::new(),
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.response_type = ResponseType::Ephemeral;
        self
    }

    pub fn header(mut self, block_id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = TextObject::plain(text);
        self.blocks.push(Block::Header { block_id: block_id.into(), text });
        self
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    /// Slack rejects image blocks without a URL, so a blank `image_url` adds nothing.
    pub fn image(
        mut self,
        block_id: impl Into<String>,
        image_url: &str,
        alt_text: impl Into<String>,
    ) -> Self {
        if !image_url.trim().is_empty() {
            self.blocks.push(Block::Image {
                block_id: block_id.into(),
                image_url: image_url.to_owned(),
                alt_text: alt_text.into(),
            });
        }
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate {
            response_type: self.response_type,
            fallback_text: self.fallback_text,
            blocks: self.blocks,
        }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

pub fn render_payload(payload: &DeliveryPayload) -> MessageTemplate {
    match (payload.status, payload.business.as_ref()) {
        (DeliveryStatus::Found, Some(business)) => found_message(&payload.location, business),
        (DeliveryStatus::Found, None) | (DeliveryStatus::NotFound, _) => {
            not_found_message(&payload.location)
        }
        (DeliveryStatus::Error, _) => error_message(&payload.location),
    }
}

pub fn found_message(location: &str, business: &Business) -> MessageTemplate {
    let location = escape_mrkdwn(location);
    MessageBuilder::new(format!("Happy Hour!!!! How about {}?", business.name))
        .header("happytaps.found.header.v1", "Happy Hour!!!!")
        .context("happytaps.found.pretext.v1", |context| {
            context.mrkdwn(format!(
                "Let's get some drinks near *{location}*, what do you think about this?"
            ));
        })
        .image("happytaps.found.image.v1", &business.image_url, IMAGE_ALT_TEXT)
        .section("happytaps.found.link.v1", |section| {
            section.mrkdwn(format!(
                "<{}|{}>",
                business.url.replace(['<', '>', '|'], ""),
                escape_mrkdwn(&business.name)
            ));
        })
        .build()
}

pub fn not_found_message(location: &str) -> MessageTemplate {
    let location = escape_mrkdwn(location);
    MessageBuilder::new("No Happy Hour!!!!")
        .header("happytaps.not_found.header.v1", "No Happy Hour!!!!")
        .context("happytaps.not_found.detail.v1", |context| {
            context.mrkdwn(format!("No bars are available near *{location}*! LAME!"));
        })
        .build()
}

pub fn error_message(location: &str) -> MessageTemplate {
    let location = escape_mrkdwn(location);
    MessageBuilder::new("Happy Hour is on hold")
        .header("happytaps.error.header.v1", "Happy Hour is on hold")
        .context("happytaps.error.detail.v1", |context| {
            context.mrkdwn(format!(
                "Couldn't look up bars near *{location}* right now. Please try again in a bit."
            ));
        })
        .build()
}

pub fn ack_message(text: &str) -> MessageTemplate {
    MessageBuilder::new(text).ephemeral().build()
}

pub fn unsupported_command_message(command: &str) -> MessageTemplate {
    MessageBuilder::new(format!("Sorry, I don't know how to handle `{command}`."))
        .ephemeral()
        .build()
}

/// Escapes the three control characters Slack reserves in mrkdwn.
fn escape_mrkdwn(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
