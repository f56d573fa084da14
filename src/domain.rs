use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

static HOST_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("valid label regex"));

pub fn has_valid_tld(domain: &str) -> bool {
    if domain.is_empty() || domain.len() < 3 || !domain.contains('.') {
        return false;
    }

    if let Some(last_dot) = domain.rfind('.') {
        if last_dot == domain.len() - 1 {
            return false;
        }
        let tld = &domain[last_dot + 1..];
        tld.len() >= 2
            && tld
                .chars()
                .all(|c| c.is_ascii_lowercase() && c.is_ascii_alphabetic())
    } else {
        false
    }
}

/// Reduce user input such as `https://www.Example.com/pricing` to `example.com`.
pub fn normalize_brand_domain(input: &str) -> Result<String> {
    let mut domain = input.trim().to_lowercase();

    if let Some(pos) = domain.find("://") {
        domain = domain[pos + 3..].to_string();
    }
    if let Some(end) = domain.find(['/', '?', '#']) {
        domain.truncate(end);
    }
    if let Some(stripped) = domain.strip_prefix("www.") {
        domain = stripped.to_string();
    }
    let domain = domain.trim_end_matches('.').to_string();

    if !has_valid_tld(&domain) {
        anyhow::bail!("'{}' is not a valid domain (expected something like example.com)", input.trim());
    }
    if !domain.split('.').all(|label| HOST_LABEL.is_match(label)) {
        anyhow::bail!("'{}' contains characters that are not allowed in a domain", input.trim());
    }

    Ok(domain)
}

/// Trim topics, drop blanks and case-insensitive duplicates, keep the first spelling.
pub fn clean_topics<S: AsRef<str>>(topics: &[S]) -> Result<Vec<String>> {
    let mut cleaned: Vec<String> = Vec::new();
    for topic in topics {
        let topic = topic.as_ref().trim();
        if topic.is_empty() {
            continue;
        }
        if cleaned.iter().any(|t| t.to_lowercase() == topic.to_lowercase()) {
            continue;
        }
        cleaned.push(topic.to_string());
    }

    if cleaned.is_empty() {
        anyhow::bail!("At least one non-empty topic is required");
    }
    Ok(cleaned)
}
