//! `webprof record`: capture a profile for a request the host already served

use anyhow::{bail, Result};
use clap::Args;
use std::time::Duration;
use webprof_core::{Profiler, RequestSnapshot};

#[derive(Args)]
pub struct RecordArgs {
    /// HTTP method
    pub method: String,
    /// Request URL, query string included
    pub url: String,
    /// Client IP address
    #[arg(long, default_value = "127.0.0.1")]
    pub ip: String,
    /// Response status code
    #[arg(long)]
    pub status: Option<u16>,
    /// Time spent handling the request, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub duration_ms: u64,
    /// Peak memory in bytes
    #[arg(long)]
    pub memory: Option<u64>,
    /// Token of the enclosing request's profile
    #[arg(long)]
    pub parent: Option<String>,
    /// Request header as NAME=VALUE (repeatable)
    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))
}

pub fn execute(profiler: &Profiler, args: &RecordArgs) -> Result<()> {
    let mut snapshot = RequestSnapshot::new(&args.method, &args.url, &args.ip);
    snapshot.status_code = args.status;
    snapshot.duration = Duration::from_millis(args.duration_ms);
    snapshot.peak_memory = args.memory;
    snapshot.parent.clone_from(&args.parent);
    snapshot.headers = args.headers.iter().cloned().collect();
    if let Some((_, query)) = args.url.split_once('?') {
        snapshot.query = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
    }

    let Some(profile) = profiler.collect(&snapshot) else {
        bail!("Profiler is disabled");
    };
    if !profiler.save_profile(&profile)? {
        bail!("Token {} already exists", profile.token);
    }

    tracing::info!(token = %profile.token, url = %profile.url, "recorded profile");
    println!("{}", profile.token);
    Ok(())
}
