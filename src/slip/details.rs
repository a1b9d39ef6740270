use regex::Regex;
use std::sync::LazyLock;

use super::extract::{extract_event, extract_player_name, stat_phrase};
use super::fields::find_date;
use super::market::{classify_side, market_key, spread_number};
use super::model::{BetKind, MarketKind, MarketType, ParsedBet};
use super::score::score;
use super::text::{collapse_whitespace, find_selection_odds, has_letters, strip_inline_odds};

static THRESHOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:over|under|o|u)\s*(\d+(?:\.\d+)?)").expect("threshold regex")
});
static MILESTONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+(?:\.\d+)?)\+").expect("milestone regex"));
static HALF_POINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+\.5)\b").expect("half point regex"));
static SIGNED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s|\()([+-]\d{1,2}(?:\.\d+)?)(?:\s|\)|$)").expect("signed line regex")
});
static TEAM_STOP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s(?:[+-]?\d|ml\b|moneyline\b|money line\b|team total\b|tt\b|pk\b|alt\b)")
        .expect("team stop regex")
});

static PERIODS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\b(1st|first)\s+half\b|\b1h\b", "1H"),
        (r"\b(2nd|second)\s+half\b|\b2h\b", "2H"),
        (r"\b(1st|first)\s+quarter\b|\b1q\b", "1Q"),
        (r"\b(2nd|second)\s+quarter\b|\b2q\b", "2Q"),
        (r"\b(3rd|third)\s+quarter\b|\b3q\b", "3Q"),
        (r"\b(4th|fourth)\s+quarter\b|\b4q\b", "4Q"),
        (r"\b(1st|first)\s+period\b|\b1p\b", "1P"),
        (r"\b(2nd|second)\s+period\b|\b2p\b", "2P"),
        (r"\b(3rd|third)\s+period\b|\b3p\b", "3P"),
        (r"\b(1st|first)\s+(5|five)\s+innings\b|\bf5\b", "F5"),
    ]
    .into_iter()
    .map(|(pattern, tag)| {
        (
            Regex::new(&format!("(?i){}", pattern)).expect("period regex"),
            tag,
        )
    })
    .collect()
});

const LEAGUES: &[(&str, &str)] = &[
    ("nfl", "Football"),
    ("ncaaf", "Football"),
    ("cfb", "Football"),
    ("nba", "Basketball"),
    ("wnba", "Basketball"),
    ("ncaab", "Basketball"),
    ("cbb", "Basketball"),
    ("mlb", "Baseball"),
    ("nhl", "Hockey"),
    ("mls", "Soccer"),
    ("epl", "Soccer"),
    ("ucl", "Soccer"),
    ("ufc", "MMA"),
    ("atp", "Tennis"),
    ("wta", "Tennis"),
    ("pga", "Golf"),
];

pub(crate) const SPORTS: &[&str] = &[
    "football",
    "basketball",
    "baseball",
    "hockey",
    "soccer",
    "tennis",
    "golf",
    "mma",
    "boxing",
    "cricket",
    "rugby",
    "esports",
];

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|ch: char| !ch.is_ascii_alphanumeric() && ch != '-')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
}

pub(crate) fn has_word(text: &str, word: &str) -> bool {
    tokens(text).any(|token| token == word)
}

/// Sport and league named anywhere in `text`.
pub(crate) fn detect_league(text: &str) -> Option<(String, String)> {
    tokens(text).find_map(|token| {
        LEAGUES
            .iter()
            .find(|(league, _)| *league == token)
            .map(|(league, sport)| (sport.to_string(), league.to_ascii_uppercase()))
    })
}

pub(crate) fn detect_period(text: &str) -> Option<&'static str> {
    PERIODS
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, tag)| *tag)
}

pub(crate) fn is_live(text: &str) -> bool {
    has_word(text, "live") || text.to_lowercase().contains("in-game")
}

pub(crate) fn is_alt(text: &str) -> bool {
    has_word(text, "alt") || has_word(text, "alternate")
}

/// Signed spread or the threshold of an over/under style selection.
pub(crate) fn extract_line(text: &str, kind: MarketKind) -> Option<f64> {
    let text = strip_inline_odds(text);
    match kind {
        MarketKind::Spread => spread_line(&text),
        MarketKind::AltLine => threshold_line(&text).or_else(|| spread_line(&text)),
        MarketKind::Total | MarketKind::TeamTotal | MarketKind::PlayerProp => {
            threshold_line(&text)
        }
        _ => None,
    }
}

fn spread_line(text: &str) -> Option<f64> {
    if let Some(value) = SIGNED_LINE
        .captures(text)
        .and_then(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
    {
        return Some(value);
    }
    spread_number(text)
}

fn threshold_line(text: &str) -> Option<f64> {
    [&*THRESHOLD, &*MILESTONE, &*HALF_POINT]
        .iter()
        .find_map(|pattern| {
            pattern
                .captures(text)
                .and_then(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        })
}

/// Team named ahead of the line for team-level markets.
pub(crate) fn extract_team(text: &str, kind: MarketKind) -> Option<String> {
    if !matches!(
        kind,
        MarketKind::Moneyline | MarketKind::Spread | MarketKind::TeamTotal | MarketKind::AltLine
    ) {
        return None;
    }
    let text = collapse_whitespace(&strip_inline_odds(text));
    let padded = format!(" {}", text);
    let end = TEAM_STOP
        .find(&padded)
        .map_or(padded.len(), |found| found.start());
    let team = padded[..end].trim().trim_end_matches(|ch: char| matches!(ch, '-' | ':' | ','));
    let team = team.trim();
    (has_letters(team) && !has_word(team, "over") && !has_word(team, "under"))
        .then(|| team.to_string())
}

/// A bet for one selection with every field readable from the selection
/// itself. Amounts, event context and scoring are left to the caller.
pub(crate) fn selection_bet(selection: &str, market_type: MarketType, kind: BetKind) -> ParsedBet {
    let selection_text = collapse_whitespace(selection);
    let market_text = strip_inline_odds(&selection_text);
    let is_prop = market_type.kind == MarketKind::PlayerProp;
    let event = extract_event(selection);
    let (sport, league) = detect_league(&selection_text).unzip();

    ParsedBet {
        kind,
        sport,
        league,
        event_date: find_date(&selection_text),
        home_team: event.as_ref().map(|event| event.home.clone()),
        away_team: event.as_ref().map(|event| event.away.clone()),
        event: event.map(|event| event.text),
        market_type,
        market_key: market_key(market_type, &market_text),
        player: is_prop.then(|| extract_player_name(&market_text)).flatten(),
        stat: is_prop.then(|| stat_phrase(&market_text)).flatten(),
        period: detect_period(&market_text).map(str::to_string),
        line: extract_line(&market_text, market_type.kind),
        side: classify_side(&market_text),
        team: extract_team(&market_text, market_type.kind),
        odds_american: find_selection_odds(&selection_text),
        is_alt: is_alt(&market_text),
        is_live: is_live(&market_text),
        market_text,
        selection_text,
        ..ParsedBet::default()
    }
}

/// Sets event context when the selection did not carry its own matchup.
pub(crate) fn attach_event(bet: &mut ParsedBet, context: &str) {
    if bet.event.is_some() {
        return;
    }
    if let Some(event) = extract_event(context) {
        bet.home_team = Some(event.home);
        bet.away_team = Some(event.away);
        bet.event = Some(event.text);
    }
}

/// Scores `bet` against `raw` and merges the issues it reports.
pub(crate) fn apply_score(bet: &mut ParsedBet, raw: &str) {
    let result = score(raw, bet.market_type, bet.odds_american, bet.event.as_deref());
    bet.confidence = result.confidence;
    for issue in &result.issues {
        bet.push_issue(issue);
    }
}
