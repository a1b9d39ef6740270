use regex::Regex;
use std::sync::LazyLock;

static INLINE_ODDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\s*([+-]\d{2,5}|\d{3,5})\b").expect("inline odds regex"));
static TRAILING_ODDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\s*([+-]\d{2,5}|\d{3,5})\s*$").expect("trailing odds regex"));
static STANDALONE_ODDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s(])([+-]\d{3,5})(?:[\s)]|$)").expect("standalone odds regex")
});
static EVEN_ODDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(even|evn)\b").expect("even odds regex"));
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+-]?\$?\d[\d,]*(?:\.\d+)?").expect("number regex"));

pub(crate) fn collapse_whitespace(value: &str) -> String {
    let mut out = String::new();
    let mut last_space = false;
    for ch in value.chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    out.trim().to_string()
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parses `$1,250.00`, `1250`, `+150` style tokens.
pub(crate) fn parse_number(token: &str) -> Option<f64> {
    let cleaned = token
        .trim()
        .chars()
        .filter(|ch| *ch != '$' && *ch != ',')
        .collect::<String>();
    if cleaned.is_empty() {
        return None;
    }
    let value = cleaned.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

pub(crate) fn last_number(text: &str) -> Option<f64> {
    NUMBER
        .find_iter(text)
        .last()
        .and_then(|found| parse_number(found.as_str()))
}

pub(crate) fn strip_inline_odds(text: &str) -> String {
    collapse_whitespace(&INLINE_ODDS.replace_all(text, " "))
}

pub(crate) fn has_trailing_odds(text: &str) -> bool {
    TRAILING_ODDS.is_match(text.trim())
}

/// Splits `Chiefs ML @ -150` into (`Chiefs ML`, -150).
pub(crate) fn split_trailing_odds(text: &str) -> Option<(String, i64)> {
    let trimmed = text.trim();
    let caps = TRAILING_ODDS.captures(trimmed)?;
    let whole = caps.get(0)?;
    let odds = parse_odds_token(caps.get(1)?.as_str())?;
    let rest = collapse_whitespace(&trimmed[..whole.start()]);
    Some((rest, odds))
}

/// Odds quoted on a selection: an `@ ±NNN` token first, then a bare `±NNN`.
pub(crate) fn find_selection_odds(text: &str) -> Option<i64> {
    if let Some(odds) = INLINE_ODDS
        .captures_iter(text)
        .last()
        .and_then(|caps| parse_odds_token(caps.get(1)?.as_str()))
    {
        return Some(odds);
    }
    if let Some(odds) = STANDALONE_ODDS
        .captures_iter(text)
        .filter_map(|caps| parse_odds_token(caps.get(1)?.as_str()))
        .last()
    {
        return Some(odds);
    }
    EVEN_ODDS.is_match(text).then_some(100)
}

fn parse_odds_token(token: &str) -> Option<i64> {
    let value = token.trim().trim_start_matches('+').parse::<i64>().ok()?;
    (value.abs() >= 100).then_some(value)
}

pub(crate) fn has_letters(text: &str) -> bool {
    text.chars().any(|ch| ch.is_alphabetic())
}
