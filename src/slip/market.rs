use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

use super::extract::{extract_player_name, has_stat_keyword, infer_player_prop_market_key};
use super::model::{MarketKind, MarketType, Side};
use super::text::strip_inline_odds;

static GAME_TOTAL_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(team|game|match)\s+total\b|\btotal\s+(points|goals|runs)\b")
        .expect("game total regex")
});
static GAME_PROP_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(overtime|draw|tie|both teams|either team|will there be|winning margin|race to)\b")
        .expect("game prop regex")
});
static SPREAD_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d{1,2}(?:\.\d+)?$").expect("spread regex"));
/// Numbers that are never a line: leg counts, dates and clock times.
static NON_LINE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d{1,2}\s*-?\s*(?:legs?|picks?|teams?)\b|\b\d{1,2}:\d{2}\s*(?:am|pm)?|\b\d{1,2}/\d{1,2}(?:/\d{2,4})?|\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(?:,\s*\d{4})?",
    )
    .expect("non-line number regex")
});

/// Selection text prepared once for every rule.
pub(crate) struct MarketText {
    raw: String,
    lower: String,
}

impl MarketText {
    pub(crate) fn new(text: &str) -> Self {
        let raw = strip_inline_odds(text);
        let lower = raw.to_lowercase();
        Self { raw, lower }
    }

    fn has_token(&self, token: &str) -> bool {
        self.lower
            .split(|ch: char| !ch.is_ascii_alphanumeric())
            .any(|part| part == token)
    }

    fn has_any(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|phrase| self.lower.contains(phrase))
    }
}

pub(crate) struct MarketRule {
    pub(crate) name: &'static str,
    pub(crate) apply: fn(&MarketText) -> Option<MarketKind>,
}

/// Ordered market rules; the first rule that answers wins. The stat-keyword
/// rule sits ahead of the bare `ml` token so prop lines never read as
/// moneylines, and game-prop phrases sit ahead of the generic prop wording.
/// Game-level total phrases ("total points", "team total") are claimed before
/// the stat keywords they contain.
pub(crate) const MARKET_RULES: &[MarketRule] = &[
    MarketRule {
        name: "explicit_moneyline",
        apply: |text| text.has_any(&["moneyline", "money line"]).then_some(MarketKind::Moneyline),
    },
    MarketRule {
        name: "game_total_phrase",
        apply: |text| {
            let found = GAME_TOTAL_PHRASE.captures(&text.lower)?;
            if found.get(1).is_some_and(|word| word.as_str() == "team") {
                Some(MarketKind::TeamTotal)
            } else {
                Some(MarketKind::Total)
            }
        },
    },
    MarketRule {
        name: "stat_keyword",
        apply: |text| {
            (has_stat_keyword(&text.raw) || extract_player_name(&text.raw).is_some())
                .then_some(MarketKind::PlayerProp)
        },
    },
    MarketRule {
        name: "ml_token",
        apply: |text| text.has_token("ml").then_some(MarketKind::Moneyline),
    },
    MarketRule {
        name: "team_total",
        apply: |text| {
            (text.lower.contains("team total") || text.has_token("tt"))
                .then_some(MarketKind::TeamTotal)
        },
    },
    MarketRule {
        name: "total",
        apply: |text| {
            (text.has_token("over")
                || text.has_token("under")
                || text.has_token("total")
                || text.lower.contains("o/u"))
            .then_some(MarketKind::Total)
        },
    },
    MarketRule {
        name: "first_td",
        apply: |text| {
            text.has_any(&["first td", "first touchdown", "1st td", "1st touchdown"])
                .then_some(MarketKind::FirstTd)
        },
    },
    MarketRule {
        name: "anytime_td",
        apply: |text| {
            text.has_any(&["anytime td", "anytime touchdown"])
                .then_some(MarketKind::AnytimeTd)
        },
    },
    MarketRule {
        name: "alt_line",
        apply: |text| {
            (text.has_token("alt") || text.has_token("alternate")).then_some(MarketKind::AltLine)
        },
    },
    MarketRule {
        name: "future",
        apply: |text| {
            text.has_any(&["future", "outright"]).then_some(MarketKind::Future)
        },
    },
    MarketRule {
        name: "game_prop",
        apply: |text| {
            (text.lower.contains("game prop") || is_game_prop_phrase(&text.lower))
                .then_some(MarketKind::GameProp)
        },
    },
    MarketRule {
        name: "player_prop_phrase",
        apply: |text| {
            (text.has_any(&[
                "to record",
                "double double",
                "double-double",
                "triple double",
                "triple-double",
            ]) || text.has_token("prop")
                || text.has_token("props"))
            .then_some(MarketKind::PlayerProp)
        },
    },
    MarketRule {
        name: "to_score",
        apply: |text| {
            if !text.has_any(&["to score", "to hit"]) {
                return None;
            }
            if is_game_prop_phrase(&text.lower) || text.lower.contains("team to score") {
                Some(MarketKind::GameProp)
            } else {
                Some(MarketKind::PlayerProp)
            }
        },
    },
    MarketRule {
        name: "spread_number",
        apply: |text| spread_number(&text.lower).map(|_| MarketKind::Spread),
    },
];

pub(crate) fn is_game_prop_phrase(lower: &str) -> bool {
    GAME_PROP_PHRASE.is_match(lower)
}

/// First number in [-30, 30] that can be a spread line, with `pk` read as 0.
pub(crate) fn spread_number(text: &str) -> Option<f64> {
    let cleaned = NON_LINE_NUMBER.replace_all(text, " ");
    cleaned.split_whitespace().find_map(|token| {
        if matches!(
            token.to_ascii_lowercase().as_str(),
            "pk" | "pick" | "pick'em" | "pickem"
        ) {
            return Some(0.0);
        }
        let token = token.trim_matches(|ch: char| matches!(ch, '(' | ')' | ','));
        if !SPREAD_NUMBER.is_match(token) {
            return None;
        }
        token
            .parse::<f64>()
            .ok()
            .filter(|value| (-30.0..=30.0).contains(value))
    })
}

/// Name of the rule that classifies `text`, if any.
#[cfg(test)]
pub(crate) fn matching_rule(text: &str) -> Option<&'static str> {
    let prepared = MarketText::new(text);
    MARKET_RULES
        .iter()
        .find(|rule| (rule.apply)(&prepared).is_some())
        .map(|rule| rule.name)
}

pub fn classify_market(text: &str) -> MarketType {
    let prepared = MarketText::new(text);
    match MARKET_RULES
        .iter()
        .find_map(|rule| Some((rule.name, (rule.apply)(&prepared)?)))
    {
        Some((name, kind)) => {
            trace!("market rule {} -> {}", name, kind.as_str());
            MarketType::plain(kind)
        }
        None => MarketType::plain(MarketKind::Other),
    }
}

pub fn classify_side(text: &str) -> Option<Side> {
    let lower = text.to_lowercase();
    let has = |word: &str| {
        lower
            .split(|ch: char| !ch.is_ascii_alphanumeric())
            .any(|part| part == word)
    };
    if has("over") {
        Some(Side::Over)
    } else if has("under") {
        Some(Side::Under)
    } else if has("yes") {
        Some(Side::Yes)
    } else if has("no") {
        Some(Side::No)
    } else {
        None
    }
}

/// Provider-style bucket for live tracking, stable for a given market type
/// and selection text.
pub fn market_key(market_type: MarketType, selection_text: &str) -> String {
    let key = match market_type.kind {
        MarketKind::Moneyline => "h2h",
        MarketKind::Spread => "spreads",
        MarketKind::Total => "totals",
        MarketKind::TeamTotal => "team_totals",
        MarketKind::PlayerProp => infer_player_prop_market_key(selection_text),
        MarketKind::GameProp => "game_props",
        MarketKind::FirstTd => "player_1st_td",
        MarketKind::AnytimeTd => "player_anytime_td",
        MarketKind::AltLine => match classify_side(selection_text) {
            Some(Side::Over) | Some(Side::Under) => "alternate_totals",
            _ => "alternate_spreads",
        },
        MarketKind::Future => "outrights",
        MarketKind::Other => "other",
        MarketKind::Parlay => "parlay",
    };
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(text: &str) -> MarketKind {
        classify_market(text).kind
    }

    #[test]
    fn spread_wins_over_odds_style_number() {
        assert_eq!(kind("Cowboys -3.5 @ -110"), MarketKind::Spread);
        assert_eq!(matching_rule("Cowboys -3.5 @ -110"), Some("spread_number"));
    }

    #[test]
    fn ml_token_is_moneyline() {
        assert_eq!(kind("Team ML -110"), MarketKind::Moneyline);
        assert_eq!(matching_rule("Team ML -110"), Some("ml_token"));
        assert_eq!(kind("Kansas City Chiefs Moneyline"), MarketKind::Moneyline);
    }

    #[test]
    fn prop_line_never_reads_as_moneyline() {
        assert_eq!(kind("Kelce Over 67.5 Receiving Yards"), MarketKind::PlayerProp);
        assert_eq!(kind("Kelce ML Over 67.5 Receiving Yards"), MarketKind::PlayerProp);
        assert_eq!(
            matching_rule("Kelce ML Over 67.5 Receiving Yards"),
            Some("stat_keyword")
        );
    }

    #[test]
    fn totals_and_team_totals() {
        assert_eq!(kind("Over 47.5"), MarketKind::Total);
        assert_eq!(kind("Chiefs/Bills Total Points Over 47.5"), MarketKind::Total);
        assert_eq!(kind("Chiefs Team Total Over 24.5"), MarketKind::TeamTotal);
        assert_eq!(kind("Chiefs TT o24.5"), MarketKind::TeamTotal);
    }

    #[test]
    fn touchdown_scorers() {
        assert_eq!(kind("Travis Kelce First TD Scorer"), MarketKind::FirstTd);
        assert_eq!(kind("Isiah Pacheco Anytime Touchdown Scorer"), MarketKind::AnytimeTd);
    }

    #[test]
    fn alt_future_and_game_props() {
        assert_eq!(kind("Alt Spread Chiefs -10.5"), MarketKind::AltLine);
        assert_eq!(kind("Chiefs To Win Super Bowl Futures"), MarketKind::Future);
        assert_eq!(kind("Will There Be Overtime? Yes"), MarketKind::GameProp);
        assert_eq!(kind("Both Teams To Score"), MarketKind::GameProp);
    }

    #[test]
    fn player_prop_phrases() {
        assert_eq!(kind("Jokic To Record A Triple-Double"), MarketKind::PlayerProp);
        assert_eq!(kind("Aaron Judge To Hit A Home Run"), MarketKind::PlayerProp);
        assert_eq!(kind("Mahomes To Score"), MarketKind::PlayerProp);
    }

    #[test]
    fn unknown_text_is_other() {
        assert_eq!(kind("Bet Placed"), MarketKind::Other);
        assert_eq!(kind("Lakers +150"), MarketKind::Other);
        assert_eq!(kind("2 Leg Parlay"), MarketKind::Other);
        assert_eq!(kind("Celtics PK"), MarketKind::Spread);
    }

    #[test]
    fn any_small_number_reads_as_spread() {
        assert_eq!(kind("Celtics 3"), MarketKind::Spread);
        assert_eq!(kind("Lakers 7 @ -110"), MarketKind::Spread);
        assert_eq!(matching_rule("Lakers 7 @ -110"), Some("spread_number"));
        assert_eq!(spread_number("lakers 7"), Some(7.0));
        assert_eq!(spread_number("celtics 31"), None);
    }

    #[test]
    fn counts_dates_and_times_are_not_lines() {
        assert_eq!(kind("3 Leg Parlay"), MarketKind::Other);
        assert_eq!(kind("2-Leg SGP"), MarketKind::Other);
        assert_eq!(kind("Placed Jan 5, 2025 7:30PM"), MarketKind::Other);
        assert_eq!(kind("Starts 10/12 8:15 PM"), MarketKind::Other);
    }

    #[test]
    fn game_total_phrase_is_claimed_before_stat_keywords() {
        assert_eq!(
            matching_rule("Chiefs/Bills Total Points Over 47.5"),
            Some("game_total_phrase")
        );
        assert_eq!(matching_rule("Chiefs Team Total Over 24.5"), Some("game_total_phrase"));
        assert_eq!(kind("Chiefs Team Total Points Over 24.5"), MarketKind::TeamTotal);
        assert_eq!(matching_rule("Jalen Brunson Over 25.5 Points"), Some("stat_keyword"));
    }

    #[test]
    fn rules_are_uniquely_named() {
        let mut names = MARKET_RULES.iter().map(|rule| rule.name).collect::<Vec<_>>();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MARKET_RULES.len());
    }

    #[test]
    fn side_detection() {
        assert_eq!(classify_side("Kelce Over 67.5"), Some(Side::Over));
        assert_eq!(classify_side("u47.5 Under"), Some(Side::Under));
        assert_eq!(classify_side("Overtime? Yes"), Some(Side::Yes));
        assert_eq!(classify_side("Both Teams To Score - No"), Some(Side::No));
        assert_eq!(classify_side("Chiefs ML"), None);
    }

    #[test]
    fn market_keys() {
        assert_eq!(market_key(MarketType::plain(MarketKind::Moneyline), "Chiefs ML"), "h2h");
        assert_eq!(
            market_key(
                MarketType::plain(MarketKind::PlayerProp).into_parlay(),
                "Kelce Over 67.5 Receiving Yards"
            ),
            "player_reception_yds"
        );
        assert_eq!(
            market_key(MarketType::plain(MarketKind::AltLine), "Alt Total Over 50.5"),
            "alternate_totals"
        );
        assert_eq!(market_key(MarketType::plain(MarketKind::Parlay), "x"), "parlay");
    }
}
