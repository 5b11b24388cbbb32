use std::net::Ipv6Addr;

use crate::types::ResponseFormat;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub api_addr: String,
    pub cors_origins: Vec<String>,
    pub response_format: ResponseFormat,
}

impl CoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_addr = lookup("PROBCALC_API_ADDR")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| {
                let host = lookup("PROBCALC_HOST")
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .unwrap_or_else(|| DEFAULT_HOST.to_string());
                let port = parse_port(lookup("PROBCALC_PORT").as_deref());
                join_host_port(&host, port)
            });

        let cors_origins = normalize_origins(
            lookup("PROBCALC_CORS_ORIGIN")
                .as_deref()
                .unwrap_or("*"),
        );

        let response_format =
            normalize_response_format(lookup("PROBCALC_RESPONSE_FORMAT").as_deref());

        CoreConfig {
            api_addr,
            cors_origins,
            response_format,
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|origin| origin == "*")
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_port(value: Option<&str>) -> u16 {
    value
        .and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|port| *port != 0)
        .unwrap_or(DEFAULT_PORT)
}

/// Bare IPv6 literals are bracketed so the port stays unambiguous.
fn join_host_port(host: &str, port: u16) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

pub fn normalize_origins(value: &str) -> Vec<String> {
    let mut origins = value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect::<Vec<_>>();
    origins.dedup();

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        vec!["*".to_string()]
    } else {
        origins
    }
}

fn normalize_response_format(value: Option<&str>) -> ResponseFormat {
    let format = value.unwrap_or("legacy").trim().to_ascii_lowercase();
    if format == "tagged" {
        ResponseFormat::Tagged
    } else {
        ResponseFormat::Legacy
    }
}
