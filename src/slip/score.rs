use super::model::MarketType;
use super::text::{has_trailing_odds, round_cents};

pub const MISSING_ODDS: &str = "missing_odds";
pub const MISSING_EVENT: &str = "missing_event";
pub const UNKNOWN_MARKET: &str = "unknown_market";
pub const MISSING_RISK: &str = "missing_risk";
pub const MISSING_TO_WIN: &str = "missing_to_win";
pub const NEEDS_REVIEW: &str = "needs_review";
pub const PARLAY_DETECTED: &str = "parlay_detected";
pub const PENDING_LIST_UNPARSED: &str = "pending_list_unparsed";
pub const EMPTY_INPUT: &str = "empty_input";
pub const TO_WIN_IS_RETURN: &str = "to_win_is_return";

pub const MIN_CONFIDENCE: f64 = 0.05;
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Taken off bets that stand in for a slip the segmenters could not split.
pub(crate) const FALLBACK_PENALTY: f64 = 0.15;

const BASE: f64 = 0.35;
const ODDS_WEIGHT: f64 = 0.20;
const EVENT_WEIGHT: f64 = 0.10;
const MARKET_WEIGHT: f64 = 0.20;
const LEG_SIGNAL_WEIGHT: f64 = 0.10;

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub confidence: f64,
    pub issues: Vec<String>,
}

/// Heuristic trust in one extracted wager. The review UI sorts on this, so the
/// weights are fixed.
pub fn score(raw: &str, market_type: MarketType, odds: Option<i64>, event: Option<&str>) -> Score {
    let mut confidence = BASE;
    let mut issues = Vec::new();

    if odds.is_some() {
        confidence += ODDS_WEIGHT;
    } else {
        issues.push(MISSING_ODDS.to_string());
    }
    if event.is_some_and(|value| !value.trim().is_empty()) {
        confidence += EVENT_WEIGHT;
    } else {
        issues.push(MISSING_EVENT.to_string());
    }
    if market_type.is_unknown() {
        issues.push(UNKNOWN_MARKET.to_string());
    } else {
        confidence += MARKET_WEIGHT;
    }
    if has_trailing_odds(raw) {
        confidence += LEG_SIGNAL_WEIGHT;
    }

    Score {
        confidence: clamp_confidence(confidence),
        issues,
    }
}

pub(crate) fn clamp_confidence(value: f64) -> f64 {
    round_cents(value.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE))
}
