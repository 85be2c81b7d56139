use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_SECTIONS: [&str; 4] = ["A III", "B III", "C II", "D I"];

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub api_url: String,
    /// Whether `PANEN_API_URL` was set rather than derived from the port.
    pub api_url_from_env: bool,
    pub sections: Vec<String>,
    pub roster: Vec<String>,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; unset or invalid
    /// values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        let data_path = lookup("PANEN_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/panen.csv"));

        let api_url_env = lookup("PANEN_API_URL").filter(|value| !value.trim().is_empty());
        let api_url_from_env = api_url_env.is_some();
        let api_url = api_url_env.unwrap_or_else(|| format!("http://127.0.0.1:{port}"));

        let sections = lookup("PANEN_SECTIONS")
            .map(|value| split_list(&value))
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect());

        let roster = lookup("PANEN_ROSTER")
            .map(|value| split_list(&value))
            .unwrap_or_default();

        let http_timeout = lookup("PANEN_HTTP_TIMEOUT_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(15));

        Self {
            port,
            data_path,
            api_url,
            api_url_from_env,
            sections,
            roster,
            http_timeout,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
