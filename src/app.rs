use std::fs;
use std::io::IsTerminal;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use url::Url;

use crate::client::SummaryClient;
use crate::config::Config;
use crate::render::{render_html_page, render_text};
use crate::terminal::TerminalPrompt;
use crate::view::SummaryView;
use crate::Args;

const PAGE_TITLE: &str = "Summary Reports";

/// Replace one query parameter, keeping the others in order.
fn set_query_param(location: &mut Url, key: &str, value: &str) {
    let kept: Vec<(String, String)> = location
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    location
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(key, value);
}

/// The page location: `--location` (or the endpoint) with any option flags
/// applied on top.
pub fn build_location(args: &Args, client: &SummaryClient) -> Result<Url> {
    let mut location = match &args.location {
        Some(raw) => Url::parse(raw).with_context(|| format!("Invalid --location '{}'", raw))?,
        None => client.endpoint().clone(),
    };
    for (key, value) in [
        ("domain", &args.domain),
        ("period", &args.period),
        ("format", &args.format),
    ] {
        if let Some(value) = value {
            set_query_param(&mut location, key, value);
        }
    }
    Ok(location)
}

pub fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    info!(action = "start", component = "app", "Starting summary report");

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(server) = &args.server {
        config.base_url = server.clone();
    }
    let client = SummaryClient::new(&config).context("Failed to create HTTP client")?;
    let location = build_location(args, &client)?;

    let mut view = SummaryView::new(&client, location);
    if args.change {
        if !std::io::stdin().is_terminal() {
            anyhow::bail!("--change needs an interactive terminal");
        }
        if view.change_options(&mut TerminalPrompt::new())? {
            eprintln!("Location: {}", view.location());
        }
    }
    if args.expand_domains {
        view.expand_domains();
    }

    let doc = view.render();
    match &args.html {
        Some(path) => {
            fs::write(path, render_html_page(&doc, PAGE_TITLE))
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", render_text(&doc)),
    }

    info!(
        action = "complete",
        component = "app",
        duration_ms = start_time.elapsed().as_millis(),
        "Summary report completed"
    );
    Ok(())
}
