const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Whether `label` is a valid DNS label: letters, digits and inner hyphens.
fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Check that `domain` is a fully qualified host name with at least two
/// labels and an alphabetic or IDNA (`xn--`) top-level label. One trailing
/// dot is accepted.
pub fn is_valid_domain(domain: &str) -> bool {
    let name = domain.strip_suffix('.').unwrap_or(domain);
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return false;
    }

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 || !labels.iter().all(|l| is_valid_label(l)) {
        return false;
    }

    match labels.last() {
        Some(tld) => {
            let tld = tld.to_ascii_lowercase();
            tld.starts_with("xn--") || (tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        }
        None => false,
    }
}

/// Comparison key for matching domain names case-insensitively.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Split a comma-joined domain list, trimming items and dropping empty ones.
pub fn split_domain_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_domain_list(domains: &[String]) -> String {
    domains.join(",")
}
