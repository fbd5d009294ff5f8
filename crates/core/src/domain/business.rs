use serde::{Deserialize, Serialize};

/// A single directory listing. Only the fields the bot renders are kept.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Business {
    pub name: String,
    pub url: String,
    pub image_url: String,
}

impl Business {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), url: url.into(), image_url: image_url.into() }
    }
}
