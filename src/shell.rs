use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use runtime_net::{
    DecodePolicy, FetchConfig, FetchManager, FetchResult, LoadingStatus, ManagerConfig,
};
use url::Url;

use crate::page::error_page;

#[derive(Debug, Parser)]
#[command(name = "fetchview", version, about = "Fetch pages and print their HTML")]
pub struct Cli {
    /// Addresses to load, in order. A missing scheme means https.
    #[arg(required = true, value_name = "URL")]
    pub urls: Vec<String>,

    /// Print only the size of each fetched document.
    #[arg(short, long)]
    pub quiet: bool,

    #[arg(long, env = "FETCHVIEW_TIMEOUT_SECS", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    #[arg(long, env = "FETCHVIEW_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Skip bodies that are not UTF-8 instead of showing an error page.
    #[arg(long)]
    pub ignore_binary: bool,

    #[arg(short, long, default_value = "info", help = "Log filter (error, warn, info, debug, trace)")]
    pub log_level: String,
}

impl Cli {
    pub fn fetch_config(&self) -> FetchConfig {
        let mut config = FetchConfig::default();
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(ua) = &self.user_agent {
            config = config.with_user_agent(ua.clone());
        }
        config
    }

    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            decode_policy: if self.ignore_binary {
                DecodePolicy::Ignore
            } else {
                DecodePolicy::Surface
            },
            ..ManagerConfig::default()
        }
    }
}

/// Turn what a user typed into an absolute http(s) URL.
pub fn normalize_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        bail!("cannot navigate to an empty URL");
    }

    let lower = trimmed.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else if let Some((scheme, _)) = trimmed.split_once("://") {
        bail!("unsupported scheme `{scheme}` in {trimmed}");
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).with_context(|| format!("invalid URL: {trimmed}"))?;
    if url.host_str().is_none_or(str::is_empty) {
        bail!("URL has no host: {trimmed}");
    }
    Ok(url)
}

/// Load each URL in turn and print what the page view would show.
pub fn run(cli: &Cli) -> Result<()> {
    let urls = cli
        .urls
        .iter()
        .map(|u| normalize_url(u))
        .collect::<Result<Vec<_>>>()?;

    let manager = FetchManager::http(cli.fetch_config(), cli.manager_config())
        .context("building HTTP client")?;
    let status = manager.subscribe_status();
    let results = manager.subscribe_result();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for url in urls {
        let id = manager.refresh(url.clone());

        // Completions publish from the worker thread; this loop is our "main thread".
        loop {
            match status.recv().context("fetch manager went away")? {
                LoadingStatus::Loading => log::info!("#{id} loading {url}"),
                LoadingStatus::Idle => break,
            }
        }

        let mut shown = false;
        for result in results.try_iter() {
            render(&mut out, &result, cli.quiet)?;
            shown = true;
        }
        if !shown {
            log::info!("#{id} {url}: body is not text, nothing to show");
        }
        log::info!("#{id} idle");
    }
    Ok(())
}

fn render(out: &mut impl Write, result: &FetchResult, quiet: bool) -> Result<()> {
    match result {
        FetchResult::Success { text, url } if quiet => {
            writeln!(out, "{url}: {} bytes", text.len())?;
        }
        FetchResult::Success { text, .. } => {
            writeln!(out, "{text}")?;
        }
        FetchResult::Failure(err) => {
            log::warn!("load failed: {err}");
            if quiet {
                writeln!(out, "error: {err}")?;
            } else {
                write!(out, "{}", error_page(err))?;
            }
        }
        FetchResult::Empty => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use runtime_net::NetError;

    #[test]
    fn keeps_explicit_scheme() {
        let url = normalize_url("  http://example.com/a?b=1 ").unwrap();
        assert_eq!(url.as_str(), "http://example.com/a?b=1");
    }

    #[test]
    fn defaults_missing_scheme_to_https() {
        assert_eq!(
            normalize_url("example.com").unwrap().as_str(),
            "https://example.com/"
        );
        assert_eq!(
            normalize_url("example.com:8443/path").unwrap().as_str(),
            "https://example.com:8443/path"
        );
    }

    #[test]
    fn rejects_empty_and_foreign_schemes() {
        assert!(normalize_url("   ").is_err());
        assert!(normalize_url("ftp://example.com").is_err());
        assert!(normalize_url("https://").is_err());
    }

    #[test]
    fn cli_builds_configs() {
        let cli = Cli::try_parse_from([
            "fetchview",
            "--timeout-secs",
            "5",
            "--user-agent",
            "fv/1",
            "--ignore-binary",
            "example.com",
        ])
        .expect("parse");
        assert_eq!(cli.urls, vec!["example.com"]);
        let fetch = cli.fetch_config();
        assert_eq!(fetch.timeout, Some(Duration::from_secs(5)));
        assert_eq!(fetch.user_agent.as_deref(), Some("fv/1"));
        assert_eq!(cli.manager_config().decode_policy, DecodePolicy::Ignore);
        assert!(!cli.manager_config().supersede_stale);
    }

    #[test]
    fn cli_requires_a_url() {
        assert!(Cli::try_parse_from(["fetchview"]).is_err());
    }

    #[test]
    fn renders_success_and_failure() {
        let url = Url::parse("https://example.com/").unwrap();
        let ok = FetchResult::Success {
            text: "<html>ok</html>".into(),
            url,
        };
        let mut buf = Vec::new();
        render(&mut buf, &ok, false).unwrap();
        render(&mut buf, &ok, true).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "<html>ok</html>\nhttps://example.com/: 15 bytes\n");

        let failed = FetchResult::Failure(NetError::Transport("refused".into()));
        let mut buf = Vec::new();
        render(&mut buf, &failed, false).unwrap();
        let page = String::from_utf8(buf).unwrap();
        assert!(page.contains("<p>transport error: refused</p>"));
    }
}
