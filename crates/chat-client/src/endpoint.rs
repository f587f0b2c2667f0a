use crate::error::{Error, Result};
use reqwest::Url;

pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:3000/api/chat";

/// Address of the relay's chat route, checked once up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(Url);

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidEndpoint {
            url: raw.to_owned().into(),
            reason,
        };
        let url = Url::parse(raw.trim()).map_err(|_| invalid("not a valid url"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host"));
        }
        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}
