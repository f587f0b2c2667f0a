use crate::config::Credential;
use faststr::FastStr;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

pub struct RequestData {
    pub url:     FastStr,
    pub headers: HashMap<FastStr, FastStr>,
    pub body:    Value,
}

impl RequestData {
    pub fn new<T>(url: T, body: Value) -> Self
    where
        T: Into<FastStr>,
    {
        Self {
            url: url.into(),
            headers: Default::default(),
            body,
        }
    }

    pub fn bearer_auth(&mut self, auth: &Credential) {
        self.headers.insert(
            "authorization".into(),
            format!("Bearer {}", auth.expose()).into(),
        );
    }
}

impl fmt::Debug for RequestData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<_> = self
            .headers
            .keys()
            .map(|k| {
                if k.eq_ignore_ascii_case("authorization") {
                    (k.as_str(), "<redacted>")
                } else {
                    (k.as_str(), self.headers[k].as_str())
                }
            })
            .collect();
        f.debug_struct("RequestData")
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}
