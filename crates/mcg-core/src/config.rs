use std::{
    env, fs,
    net::{IpAddr, SocketAddr},
    path::Path,
    time::Duration,
};

use crate::{errors::Error, prompt::SYSTEM_PROMPT, Result};

pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Typed configuration for the gateway.
#[derive(Clone, Debug)]
pub struct Config {
    // Model provider
    pub anthropic_api_key: String,
    pub anthropic_base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub model_timeout: Duration,
    pub system_prompt: String,

    // HTTP
    pub bind_addr: SocketAddr,
    pub cors_allowed_origins: Vec<String>,
    pub log_requests: bool,

    // Sessions
    pub session_header: String,
    pub max_history_messages: usize,
    pub max_sessions: usize,
    pub session_idle_ttl: Duration,

    // Rate limiting
    pub rate_limit_enabled: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_global_requests: u32,
    pub rate_limit_window: Duration,
}

impl Config {
    /// Load from `.env` (never overriding the real environment) and env vars.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let anthropic_api_key = get("ANTHROPIC_API_KEY").ok_or_else(|| {
            Error::Config("ANTHROPIC_API_KEY environment variable is required".to_string())
        })?;
        let anthropic_base_url = get("ANTHROPIC_BASE_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = get("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let max_tokens = parse_num(get("MAX_TOKENS")).unwrap_or(1000);
        let temperature = parse_num::<f32>(get("TEMPERATURE"))
            .filter(|t| (0.0..=1.0).contains(t))
            .unwrap_or(0.3);
        let model_timeout =
            Duration::from_millis(parse_num(get("MODEL_TIMEOUT_MS")).unwrap_or(60_000));
        let system_prompt = get("SYSTEM_PROMPT").unwrap_or_else(|| SYSTEM_PROMPT.to_string());

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let ip: IpAddr = host
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("invalid HOST {host:?}: {e}")))?;
        let port = parse_num(get("PORT")).unwrap_or(5000);
        let bind_addr = SocketAddr::new(ip, port);

        let cors_allowed_origins = parse_csv(get("CORS_ALLOWED_ORIGINS"))
            .unwrap_or_else(|| vec!["*".to_string()]);
        let log_requests = parse_bool(get("LOG_REQUESTS")).unwrap_or(true);

        let session_header = get("SESSION_HEADER")
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_else(|| "x-session-id".to_string());
        let max_history_messages = parse_num(get("MAX_HISTORY_MESSAGES")).unwrap_or(0);
        let max_sessions = parse_num(get("MAX_SESSIONS")).unwrap_or(10_000);
        let session_idle_ttl =
            Duration::from_secs(parse_num(get("SESSION_IDLE_TTL")).unwrap_or(3600));

        let rate_limit_enabled = parse_bool(get("RATE_LIMIT_ENABLED")).unwrap_or(true);
        let rate_limit_requests = parse_num(get("RATE_LIMIT_REQUESTS")).unwrap_or(20);
        let rate_limit_global_requests =
            parse_num(get("RATE_LIMIT_GLOBAL_REQUESTS")).unwrap_or(rate_limit_requests);
        let rate_limit_window =
            Duration::from_secs(parse_num(get("RATE_LIMIT_WINDOW")).unwrap_or(60));

        Ok(Self {
            anthropic_api_key,
            anthropic_base_url,
            model,
            max_tokens,
            temperature,
            model_timeout,
            system_prompt,
            bind_addr,
            cors_allowed_origins,
            log_requests,
            session_header,
            max_history_messages,
            max_sessions,
            session_idle_ttl,
            rate_limit_enabled,
            rate_limit_requests,
            rate_limit_global_requests,
            rate_limit_window,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_num<T: std::str::FromStr>(v: Option<String>) -> Option<T> {
    v.and_then(|s| s.trim().parse::<T>().ok())
}

fn parse_csv(v: Option<String>) -> Option<Vec<String>> {
    let v = v?;
    let out = v
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn api_key_is_required() {
        let err = cfg_from(&[]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(cfg_from(&[("ANTHROPIC_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn defaults_apply() {
        let cfg = cfg_from(&[("ANTHROPIC_API_KEY", "k")]).unwrap();
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.anthropic_base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.max_tokens, 1000);
        assert!((cfg.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(cfg.bind_addr, "0.0.0.0:5000".parse().unwrap());
        assert_eq!(cfg.cors_allowed_origins, vec!["*"]);
        assert_eq!(cfg.session_header, "x-session-id");
        assert_eq!(cfg.max_history_messages, 0);
        assert!(cfg.rate_limit_enabled);
        assert_eq!(cfg.rate_limit_requests, 20);
        assert_eq!(cfg.rate_limit_global_requests, 20);
        assert_eq!(cfg.max_sessions, 10_000);
        assert_eq!(cfg.session_idle_ttl, Duration::from_secs(3600));
        assert_eq!(cfg.rate_limit_window, Duration::from_secs(60));
        assert_eq!(cfg.system_prompt, SYSTEM_PROMPT);
    }

    #[test]
    fn overrides_apply() {
        let cfg = cfg_from(&[
            ("ANTHROPIC_API_KEY", "k"),
            ("ANTHROPIC_BASE_URL", "http://localhost:9000/"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8443"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            ("SESSION_HEADER", "X-Client-Id"),
            ("RATE_LIMIT_ENABLED", "no"),
            ("MAX_HISTORY_MESSAGES", "40"),
            ("RATE_LIMIT_REQUESTS", "5"),
            ("RATE_LIMIT_GLOBAL_REQUESTS", "500"),
            ("MAX_SESSIONS", "64"),
            ("SESSION_IDLE_TTL", "0"),
        ])
        .unwrap();
        assert_eq!(cfg.anthropic_base_url, "http://localhost:9000");
        assert_eq!(cfg.bind_addr, "127.0.0.1:8443".parse().unwrap());
        assert_eq!(
            cfg.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(cfg.session_header, "x-client-id");
        assert!(!cfg.rate_limit_enabled);
        assert_eq!(cfg.max_history_messages, 40);
        assert_eq!(cfg.rate_limit_requests, 5);
        assert_eq!(cfg.rate_limit_global_requests, 500);
        assert_eq!(cfg.max_sessions, 64);
        assert!(cfg.session_idle_ttl.is_zero());
    }

    #[test]
    fn bad_numbers_fall_back() {
        let cfg = cfg_from(&[
            ("ANTHROPIC_API_KEY", "k"),
            ("PORT", "http"),
            ("TEMPERATURE", "7"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr.port(), 5000);
        assert!((cfg.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn bad_host_is_an_error() {
        assert!(cfg_from(&[("ANTHROPIC_API_KEY", "k"), ("HOST", "not a host")]).is_err());
    }

    #[test]
    fn dotenv_parsing() {
        let parsed = parse_dotenv("# comment\nA=1\nB = \"two\"\n\nC='3'\nbogus\n=x\n");
        assert_eq!(
            parsed,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "two".to_string()),
                ("C".to_string(), "3".to_string()),
            ]
        );
    }
}
