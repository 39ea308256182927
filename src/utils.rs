use std::net::IpAddr;

use time::macros::format_description;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let timer = LocalTime::new(format_description!(
        "[hour]:[minute]:[second].[subsecond digits:3]"
    ));

    // A second init (tests, embedding) is not an error worth reporting.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Group digits in threes with commas.
pub fn format_number(num: u64) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Canonical text for a source address; unparsable values are shown as-is.
pub fn format_address(ip: &str) -> String {
    match ip.trim().parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        Ok(addr) => addr.to_string(),
        Err(_) => ip.to_string(),
    }
}

/// Report a failure to the user; auth failures get a hint on what to do next.
pub fn display_error(err: &crate::error::ClientError) {
    if err.needs_reauth() {
        tracing::error!(action = "display", component = "error", error = %err, "Authentication required, log in to the report server and retry");
    } else {
        tracing::error!(action = "display", component = "error", error = %err, "Request failed");
    }
}

pub fn validate_args(args: &crate::args::Args) -> anyhow::Result<()> {
    if let Some(domain) = &args.domain {
        let domains = crate::domain::split_domain_list(domain);
        if domains.is_empty() {
            anyhow::bail!("--domain must name at least one domain");
        }
        for d in domains.iter().filter(|d| !crate::domain::is_valid_domain(d)) {
            tracing::warn!(action = "validate", component = "args", domain = %d, "Domain looks malformed");
        }
    }

    if let Some(period) = &args.period {
        if let Err(e) = period.parse::<crate::filter::Period>() {
            anyhow::bail!("--period: {}", e);
        }
    }

    if let Some(format) = &args.format {
        if format != "text" && format != "html" {
            anyhow::bail!("--format must be 'text' or 'html'");
        }
    }

    Ok(())
}
