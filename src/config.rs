use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

use crate::http::HttpClient;
use crate::runtime::Runtime;

/// Default bound on a whole artifact fetch, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const USER_AGENT: &str = concat!("toli-installer/", env!("CARGO_PKG_VERSION"));

/// Settings shared by every subcommand.
pub struct InstallConfig {
    pub prefix: PathBuf,
    pub timeout: Duration,
    pub http_client: HttpClient,
}

impl InstallConfig {
    pub fn new<R: Runtime>(runtime: &R, prefix: Option<PathBuf>, timeout_secs: u64) -> Result<Self> {
        let prefix = match prefix {
            Some(p) => p,
            None => default_prefix(runtime)?,
        };
        let timeout = Duration::from_secs(timeout_secs);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        let mut http_client = HttpClient::new(client);

        if let Ok(token) = runtime.env_var("GITHUB_TOKEN")
            && !token.is_empty()
        {
            http_client = http_client.with_github_token(&token)?;
            debug!(
                "Using GITHUB_TOKEN for github.com downloads: {}",
                mask_token(&token)
            );
        }

        debug!("Prefix {:?}, timeout {:?}", prefix, timeout);
        Ok(Self {
            prefix,
            timeout,
            http_client,
        })
    }
}

/// `/usr/local` for root, `~/.local` otherwise.
pub fn default_prefix<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    if runtime.is_privileged() {
        return Ok(PathBuf::from("/usr/local"));
    }
    let home = runtime
        .home_dir()
        .context("Cannot determine home directory; pass --prefix")?;
    Ok(home.join(".local"))
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}
