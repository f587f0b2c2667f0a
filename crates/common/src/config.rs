use crate::error::{Error, Result};
use faststr::FastStr;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_BASE: &str = "https://router.huggingface.co/v1";
pub const DEFAULT_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct";
pub const DEFAULT_PROVIDER_HINT: &str = "novita";
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 0.95;

/// Provider access token. Never printed.
#[derive(Clone)]
pub struct Credential(FastStr);

impl Credential {
    pub fn new<T: Into<FastStr>>(token: T) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Fixed sampling parameters used for every outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceParams {
    pub model:         FastStr,
    pub provider_hint: Option<FastStr>,
    pub temperature:   f32,
    pub max_tokens:    u32,
    pub top_p:         f32,
}

impl InferenceParams {
    /// The router picks the backend from a `model:provider` suffix.
    pub fn routed_model(&self) -> FastStr {
        match &self.provider_hint {
            Some(hint) => format!("{}:{hint}", self.model).into(),
            None => self.model.clone(),
        }
    }
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            model:         DEFAULT_MODEL.into(),
            provider_hint: Some(DEFAULT_PROVIDER_HINT.into()),
            temperature:   DEFAULT_TEMPERATURE,
            max_tokens:    DEFAULT_MAX_TOKENS,
            top_p:         DEFAULT_TOP_P,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub listen:     SocketAddr,
    pub api_base:   FastStr,
    pub credential: Credential,
    pub params:     InferenceParams,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = lookup("HF_TOKEN")
            .filter(|v| !v.trim().is_empty())
            .map(|v| Credential::new(v.trim().to_owned()))
            .ok_or(Error::MissingEnv("HF_TOKEN"))?;

        let host: IpAddr = parse_or(&lookup, "HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?;
        let port: u16 = parse_or(&lookup, "PORT", DEFAULT_PORT)?;

        let api_base = lookup("HF_API_BASE")
            .filter(|v| !v.is_empty())
            .map(|v| v.trim_end_matches('/').to_owned())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_owned());

        let model = lookup("HF_MODEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_owned());
        // An explicitly empty HF_PROVIDER lets the router choose.
        let provider_hint = match lookup("HF_PROVIDER") {
            Some(v) if v.is_empty() => None,
            Some(v) => Some(v.into()),
            None => Some(DEFAULT_PROVIDER_HINT.into()),
        };

        let params = InferenceParams {
            model: model.into(),
            provider_hint,
            temperature: parse_or(&lookup, "HF_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            max_tokens: parse_or(&lookup, "HF_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            top_p: parse_or(&lookup, "HF_TOP_P", DEFAULT_TOP_P)?,
        };

        Ok(Self {
            listen: SocketAddr::new(host, port),
            api_base: api_base.into(),
            credential,
            params,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| Error::InvalidEnv {
            name,
            value: v.into(),
        }),
    }
}

/// Log verbosity from `LOG_LEVEL`; unknown values fall back to the build default.
pub fn log_level_from_env() -> LevelFilter {
    log_level_from_env_or(if cfg!(debug_assertions) {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    })
}

pub fn log_level_from_env_or(default: LevelFilter) -> LevelFilter {
    std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
