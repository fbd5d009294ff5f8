use serde::Deserialize;

/// Response body of `GET /businesses/search`. Only the fields we render are decoded.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub businesses: Option<Vec<RawBusiness>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawBusiness {
    pub name: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}
