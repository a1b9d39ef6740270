use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::details::{apply_score, attach_event, selection_bet};
use super::extract::{extract_event, extract_player_name, has_stat_keyword, EventMatch};
use super::fields::{detect_book, is_field_label_line, is_metadata_line};
use super::market::{classify_market, is_game_prop_phrase};
use super::model::{BetKind, MarketKind, MarketType, ParsedBet};
use super::score::{clamp_confidence, FALLBACK_PENALTY, NEEDS_REVIEW, PARLAY_DETECTED};
use super::text::{
    collapse_whitespace, find_selection_odds, has_letters, has_trailing_odds, split_trailing_odds,
};

static LEG_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*-?\s*(?:leg|pick|team)s?\b").expect("leg count regex")
});

const BOILERPLATE_PREFIXES: &[&str] = &[
    "view legs", "hide legs", "balance", "home", "scores", "odds", "wager", "return", "close",
    "payout", "potential", "my bets", "bet slip", "share", "cash out", "cashout",
];

/// One leg recovered from the slip text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LegText {
    pub(crate) text: String,
    pub(crate) odds: i64,
    pub(crate) raw: String,
    pub(crate) event: Option<EventMatch>,
}

#[derive(Debug, Default)]
pub(crate) struct ParlayOutcome {
    pub(crate) bets: Vec<ParsedBet>,
    pub(crate) legs_count: usize,
}

/// Leg segmenter. An empty buffer is idle; lines accumulate until the joined
/// buffer ends in an odds token, which is the boundary that emits a leg.
#[derive(Debug, Default)]
struct LegSegmenter {
    buffer: Vec<String>,
    pending_event: Option<EventMatch>,
    legs: Vec<LegText>,
}

impl LegSegmenter {
    fn push(&mut self, line: &str) {
        if is_boilerplate(line) {
            return;
        }
        if let Some(event) = matchup_event(line) {
            match self.legs.last_mut() {
                Some(leg) if self.buffer.is_empty() && leg.event.is_none() => {
                    leg.event = Some(event);
                }
                _ => self.pending_event = Some(event),
            }
            return;
        }

        self.buffer.push(line.trim().to_string());
        let joined = collapse_whitespace(&self.buffer.join(" "));
        if let Some((text, odds)) = split_trailing_odds(&joined) {
            if has_letters(&text) {
                self.legs.push(LegText {
                    text,
                    odds,
                    raw: joined,
                    event: self.pending_event.take(),
                });
            }
            self.buffer.clear();
        }
    }

    fn finish(self) -> Vec<LegText> {
        if !self.buffer.is_empty() {
            debug!("discarding {} unterminated parlay line(s)", self.buffer.len());
        }
        self.legs
    }
}

fn matchup_event(line: &str) -> Option<EventMatch> {
    let trimmed = line.trim();
    if !trimmed.starts_with(['(', '[', '{', '|']) || has_trailing_odds(trimmed) {
        return None;
    }
    extract_event(trimmed)
}

fn is_boilerplate(line: &str) -> bool {
    let lower = collapse_whitespace(line).to_lowercase();
    if lower.is_empty() || lower == "ml" || lower.contains("parlay") {
        return true;
    }
    if BOILERPLATE_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
    {
        return true;
    }
    if detect_book(line, None).is_some() && !has_trailing_odds(line) {
        return true;
    }
    is_field_label_line(line)
        || is_metadata_line(line)
        || (!has_letters(&lower) && !lower.contains('@'))
}

/// Slip mentions a parlay, or at least two lines end in an odds token.
pub(crate) fn looks_like_parlay(text: &str) -> bool {
    let lower = text.to_lowercase();
    if lower.contains("parlay") || lower.contains("view legs") {
        return true;
    }
    text.lines().filter(|line| has_trailing_odds(line)).count() >= 2
}

pub(crate) fn segment_legs(text: &str) -> Vec<LegText> {
    let mut segmenter = LegSegmenter::default();
    for line in text.lines() {
        segmenter.push(line);
    }
    segmenter.finish()
}

/// Leg count printed in an `N Leg Parlay` header.
pub(crate) fn header_legs_count(text: &str) -> Option<usize> {
    text.lines()
        .filter(|line| line.to_lowercase().contains("parlay"))
        .find_map(|line| LEG_COUNT.captures(line)?.get(1)?.as_str().parse().ok())
        .filter(|count| *count > 0)
}

/// Odds printed on the parlay header line, e.g. `3 Leg Parlay +596`.
pub(crate) fn header_odds(text: &str) -> Option<i64> {
    text.lines()
        .filter(|line| line.to_lowercase().contains("parlay"))
        .find_map(find_selection_odds)
}

pub(crate) fn parse_parlay(text: &str) -> ParlayOutcome {
    let legs = segment_legs(text);
    let printed_count = header_legs_count(text);
    debug!("parlay: {} leg(s) segmented", legs.len());

    if legs.len() >= 2 {
        let bets = legs.iter().map(leg_bet).collect::<Vec<_>>();
        return ParlayOutcome {
            legs_count: printed_count.unwrap_or(bets.len()),
            bets,
        };
    }

    let lines = qualifying_lines(text);
    if lines.is_empty() {
        return ParlayOutcome::default();
    }
    debug!("parlay: falling back to {} combined line(s)", lines.len());
    ParlayOutcome {
        bets: vec![combined_bet(&lines, text)],
        legs_count: printed_count.unwrap_or(lines.len()),
    }
}

fn leg_bet(leg: &LegText) -> ParsedBet {
    let market = classify_market(&leg.text).into_parlay();
    let mut bet = selection_bet(&leg.text, market, BetKind::ParlayLeg);
    bet.odds_american = Some(leg.odds);
    if let Some(event) = leg.event.as_ref().filter(|_| bet.event.is_none()) {
        bet.home_team = Some(event.home.clone());
        bet.away_team = Some(event.away.clone());
        bet.event = Some(event.text.clone());
    }
    apply_score(&mut bet, &leg.raw);
    bet
}

fn qualifying_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !is_boilerplate(line) && matchup_event(line).is_none())
        .map(collapse_whitespace)
        .filter(|line| has_letters(line))
        .collect()
}

fn combined_market(combined: &str) -> MarketType {
    let kind = if has_stat_keyword(combined) || extract_player_name(combined).is_some() {
        MarketKind::PlayerProp
    } else if is_game_prop_phrase(&combined.to_lowercase()) {
        MarketKind::GameProp
    } else {
        classify_market(combined).kind
    };
    MarketType::plain(kind).into_parlay()
}

fn combined_bet(lines: &[String], context: &str) -> ParsedBet {
    let combined = lines.join(" | ");
    let mut bet = selection_bet(&combined, combined_market(&combined), BetKind::Single);
    if bet.odds_american.is_none() {
        bet.odds_american = header_odds(context);
    }
    attach_event(&mut bet, context);
    apply_score(&mut bet, &combined);
    bet.confidence = clamp_confidence(bet.confidence - FALLBACK_PENALTY);
    bet.push_issue(PARLAY_DETECTED);
    bet.push_issue(NEEDS_REVIEW);
    bet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_words_and_odds_lines() {
        assert!(looks_like_parlay("3 Leg Parlay +596"));
        assert!(looks_like_parlay("View Legs"));
        assert!(looks_like_parlay("Chiefs ML @+150\nBills -3.5 @-120"));
        assert!(!looks_like_parlay("Chiefs ML @+150\nWager: $10"));
    }

    #[test]
    fn legs_split_on_trailing_odds() {
        let legs = segment_legs("2 Leg Parlay\nChiefs ML @+150\nBuffalo Bills\n-3.5 @-120\nWager: $10");
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].text, "Chiefs ML");
        assert_eq!(legs[0].odds, 150);
        assert_eq!(legs[1].text, "Buffalo Bills -3.5");
        assert_eq!(legs[1].odds, -120);
    }

    #[test]
    fn boilerplate_is_skipped() {
        assert!(is_boilerplate("VIEW LEGS"));
        assert!(is_boilerplate("ML"));
        assert!(is_boilerplate("Odds +264"));
        assert!(is_boilerplate("$10.00"));
        assert!(is_boilerplate("FanDuel Sportsbook"));
        assert!(!is_boilerplate("@ -110"));
        assert!(!is_boilerplate("Chiefs ML"));
    }

    #[test]
    fn placement_metadata_stays_out_of_first_leg() {
        let legs = segment_legs(
            "Parlay\nPlaced Jan 5, 2025 7:30PM\nBet ID: 0012345678901\nChiefs ML @ -150\nBills -3.5 @ -110",
        );
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].text, "Chiefs ML");
        assert_eq!(legs[1].text, "Bills -3.5");
    }

    #[test]
    fn matchup_line_attaches_to_previous_leg() {
        let legs = segment_legs("Chiefs ML @ -150\n(Kansas City Chiefs @ Buffalo Bills)\nLakers -4.5 @ -110");
        assert_eq!(legs.len(), 2);
        let event = legs[0].event.as_ref().expect("event");
        assert_eq!(event.text, "Kansas City Chiefs @ Buffalo Bills");
        assert_eq!(legs[1].event, None);
    }

    #[test]
    fn legs_become_parlay_variants() {
        let outcome = parse_parlay("3 Leg Parlay +596\nChiefs ML @ -150\nTravis Kelce Over 67.5 Receiving Yards @ -115\nMystery Special @ +200");
        assert_eq!(outcome.legs_count, 3);
        let kinds = outcome
            .bets
            .iter()
            .map(|bet| bet.market_type.to_string())
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec!["moneyline_parlay", "player_prop_parlay", "parlay"]);
        assert!(outcome.bets.iter().all(|bet| bet.kind == BetKind::ParlayLeg));
        assert_eq!(outcome.bets[1].player.as_deref(), Some("Travis Kelce"));
        assert_eq!(outcome.bets[0].odds_american, Some(-150));
        assert_eq!(outcome.bets[0].confidence, 0.85);
    }

    #[test]
    fn fallback_combines_lines_with_penalty() {
        let outcome = parse_parlay("2 Leg Parlay +264\nChiefs ML\nBills -3.5\nWager: $10");
        assert_eq!(outcome.bets.len(), 1);
        assert_eq!(outcome.legs_count, 2);
        let bet = &outcome.bets[0];
        assert_eq!(bet.selection_text, "Chiefs ML | Bills -3.5");
        assert_eq!(bet.market_type.to_string(), "moneyline_parlay");
        assert_eq!(bet.odds_american, Some(264));
        assert!(bet.has_issue(PARLAY_DETECTED));
        assert!(bet.has_issue(NEEDS_REVIEW));
        // 0.35 + odds 0.20 + market 0.20 - 0.15
        assert_eq!(bet.confidence, 0.6);
    }

    #[test]
    fn fallback_prefers_player_prop_on_combined_text() {
        let outcome = parse_parlay("Parlay\nChiefs ML\nKelce Over 67.5 Receiving Yards");
        assert_eq!(outcome.bets[0].market_type.to_string(), "player_prop_parlay");
    }

    #[test]
    fn nothing_qualifies() {
        assert!(parse_parlay("Parlay\nView Legs\n$10.00").bets.is_empty());
    }
}
