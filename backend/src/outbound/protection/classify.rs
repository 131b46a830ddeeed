//! Pattern-based shield and bot classification.
//!
//! Pattern sets compile on first use. A set that fails to compile is
//! reported as a protection failure on every request that needs it.

use std::sync::OnceLock;

use regex::RegexSet;

use crate::domain::ports::ProtectionError;

type Compiled = Result<RegexSet, regex::Error>;

static SHIELD: OnceLock<Compiled> = OnceLock::new();
static BOTS: OnceLock<Compiled> = OnceLock::new();
static ALLOWED_BOTS: OnceLock<Compiled> = OnceLock::new();

const SHIELD_PATTERNS: &[&str] = &[
    // traversal
    r"(?i)(\.\./|\.\.\\|%2e%2e(%2f|%5c|/)|\.\.%2f)",
    // script injection
    r"(?i)(<\s*script|%3c\s*script|javascript:|onerror\s*=|onload\s*=)",
    // sql injection; a trailing comment only counts after a closing quote
    r"(?i)(\bunion(\s|\+|%20)+(all(\s|\+|%20)+)?select\b|'\s*or\s*'?\d+'?\s*=\s*'?\d+|%27(\s|\+|%20)*or(\s|\+|%20)|;\s*drop(\s|\+|%20)+table|\bsleep\s*\(\s*\d+\s*\)|('|%27)(\s|\+|%20)*(--|%2d%2d|#|%23))",
];

const BOT_PATTERNS: &[&str] = &[
    r"(?i)^(curl|wget|httpie|aria2)/",
    r"(?i)(python-requests|python-urllib|aiohttp|go-http-client|okhttp|libwww-perl|java/|apache-httpclient|node-fetch|axios/|scrapy)",
    r"(?i)(headlesschrome|phantomjs|selenium|puppeteer|playwright)",
    r"(?i)(bot|crawler|spider|scraper)\b",
];

const ALLOWED_BOT_PATTERNS: &[&str] = &[
    r"(?i)(googlebot|bingbot|duckduckbot|yandexbot|baiduspider|applebot)",
    r"(?i)(slackbot|twitterbot|facebookexternalhit|linkedinbot|discordbot|telegrambot|whatsapp)",
];

fn set_matches(
    cell: &'static OnceLock<Compiled>,
    name: &str,
    patterns: &[&str],
    input: &str,
) -> Result<bool, ProtectionError> {
    cell.get_or_init(|| RegexSet::new(patterns))
        .as_ref()
        .map(|set| set.is_match(input))
        .map_err(|error| ProtectionError::evaluation(format!("{name} patterns invalid: {error}")))
}

/// Whether `path` (including any query) carries an attack signature.
pub(super) fn is_attack(path: &str) -> Result<bool, ProtectionError> {
    set_matches(&SHIELD, "shield", SHIELD_PATTERNS, path)
}

/// Whether `user_agent` belongs to an automated client that is not a
/// search engine or link-preview agent.
pub(super) fn is_disallowed_bot(user_agent: &str) -> Result<bool, ProtectionError> {
    Ok(set_matches(&BOTS, "bot", BOT_PATTERNS, user_agent)?
        && !set_matches(&ALLOWED_BOTS, "allowed bot", ALLOWED_BOT_PATTERNS, user_agent)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/api/../../etc/passwd", true)]
    #[case("/api/users?q=%2e%2e%2fsecret", true)]
    #[case("/api/users?search=<script>alert(1)</script>", true)]
    #[case("/api/users?search=%3Cscript%3E", true)]
    #[case("/api/users?search=1' OR '1'='1", true)]
    #[case("/api/users?search=x UNION SELECT password FROM users", true)]
    #[case("/api/users?page=2&limit=10", false)]
    #[case("/api/users/42", false)]
    #[case("/api/users?search=o'brien", false)]
    #[case("/api/users?search=admin'--", true)]
    #[case("/api/users?search=admin%27%20--", true)]
    #[case("/api/users?search=x' #", true)]
    #[case("/api/users?search=foo--", false)]
    #[case("/api/users?search=a--b", false)]
    #[case("/api/users/release--notes", false)]
    fn shield_signatures(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_attack(path), Ok(expected));
    }

    #[rstest]
    #[case("curl/8.4.0", true)]
    #[case("Wget/1.21", true)]
    #[case("python-requests/2.31", true)]
    #[case("Mozilla/5.0 (X11; Linux x86_64) HeadlessChrome/120.0", true)]
    #[case("SomeCrawler bot", true)]
    #[case("Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)", false)]
    #[case("Slackbot-LinkExpanding 1.0", false)]
    #[case("Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) Safari/605.1.15", false)]
    #[case("Internal-Request/1.0", false)]
    fn bot_user_agents(#[case] user_agent: &str, #[case] expected: bool) {
        assert_eq!(is_disallowed_bot(user_agent), Ok(expected));
    }

    #[rstest]
    #[case(SHIELD_PATTERNS)]
    #[case(BOT_PATTERNS)]
    #[case(ALLOWED_BOT_PATTERNS)]
    fn pattern_sets_compile(#[case] patterns: &[&str]) {
        assert!(RegexSet::new(patterns).is_ok());
    }

    #[rstest]
    fn invalid_patterns_surface_as_evaluation_errors() {
        static BROKEN: OnceLock<Compiled> = OnceLock::new();
        let err = set_matches(&BROKEN, "broken", &["(unclosed"], "/").expect_err("invalid set");
        assert!(matches!(err, ProtectionError::Evaluation { .. }));
    }
}
