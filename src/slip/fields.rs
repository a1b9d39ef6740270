use regex::Regex;
use std::sync::LazyLock;

use super::text::{has_letters, last_number, round_cents};

static WAGER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(total wager|total stake|bet amount|wager|risk|stake)\b\s*:?")
        .expect("wager label regex")
});
static TO_WIN_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(to win|potential winnings|potential win|winnings|profit)\b\s*:?")
        .expect("to win label regex")
});
static RETURN_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(potential payout|total payout|potential return|total return|to return|to pay|returns?|payout)\b\s*:?",
    )
    .expect("return label regex")
});
static ODDS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(odds|price)\b\s*:?").expect("odds label regex"));
static TICKET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:ticket|bet\s*id|bet\s*#|id)\s*(?:#|no\.?|number)?\s*:?\s*#?\s*([A-Z0-9][A-Z0-9-]{5,})")
        .expect("ticket regex")
});
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2}/\d{1,2}(?:/\d{2,4})?(?:,?\s+\d{1,2}:\d{2}\s*(?:am|pm)?)?|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(?:,\s*\d{4})?(?:,?\s+(?:at\s+)?\d{1,2}:\d{2}\s*(?:am|pm)?)?)",
    )
    .expect("date regex")
});

const BOOKS: &[(&str, &str)] = &[
    ("draftkings", "DraftKings"),
    ("draft kings", "DraftKings"),
    ("fanduel", "FanDuel"),
    ("betmgm", "BetMGM"),
    ("bet mgm", "BetMGM"),
    ("caesars", "Caesars"),
    ("bet365", "bet365"),
    ("betrivers", "BetRivers"),
    ("espn bet", "ESPN BET"),
    ("espnbet", "ESPN BET"),
    ("fanatics", "Fanatics"),
    ("hard rock", "Hard Rock Bet"),
    ("pointsbet", "PointsBet"),
];

const METADATA_WORDS: &[&str] = &["placed", "on", "at", "date", "time", "accepted", "settled"];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct SlipFields {
    pub(crate) wager: Option<f64>,
    pub(crate) to_win: Option<f64>,
    pub(crate) odds_american: Option<i64>,
    pub(crate) odds_inferred: bool,
    /// `to_win` holds a total return that could not be turned into profit.
    pub(crate) to_win_is_return: bool,
}

/// Wager, profit and odds from the labeled lines of a receipt.
///
/// "To Win" is profit and wins over "Return"; a return above the wager is
/// turned into profit. Without an odds line the odds are inferred from wager
/// and profit.
pub(crate) fn parse_slip_fields(lines: &[&str]) -> SlipFields {
    let wager = labeled_value(lines, &WAGER_LABEL);
    let explicit_to_win = labeled_value(lines, &TO_WIN_LABEL);
    let to_return = labeled_value(lines, &RETURN_LABEL);
    let explicit_odds = labeled_value(lines, &ODDS_LABEL)
        .map(|value| value.round() as i64)
        .filter(|value| value.abs() >= 100);

    let (to_win, to_win_is_return) = match (explicit_to_win, to_return, wager) {
        (Some(value), _, _) => (Some(value), false),
        (None, Some(value), Some(stake)) if value > stake => (Some(round_cents(value - stake)), false),
        (None, Some(value), _) => (Some(value), true),
        (None, None, _) => (None, false),
    };

    let mut fields = SlipFields {
        wager,
        to_win,
        odds_american: explicit_odds,
        odds_inferred: false,
        to_win_is_return,
    };
    if fields.odds_american.is_none() && !to_win_is_return {
        if let (Some(stake), Some(profit)) = (wager, to_win) {
            fields.odds_american = infer_american_odds(stake, profit);
            fields.odds_inferred = fields.odds_american.is_some();
        }
    }
    fields
}

pub(crate) fn is_field_label_line(line: &str) -> bool {
    [&*WAGER_LABEL, &*TO_WIN_LABEL, &*RETURN_LABEL, &*ODDS_LABEL]
        .iter()
        .any(|label| label.is_match(line))
}

fn labeled_value(lines: &[&str], label: &Regex) -> Option<f64> {
    for (idx, line) in lines.iter().enumerate() {
        let Some(found) = label.find(line) else {
            continue;
        };
        let rest = &line[found.end()..];
        if is_value_text(rest) {
            if let Some(value) = last_number(rest) {
                return Some(value);
            }
        }
        if rest.trim().is_empty() {
            if let Some(next) = lines.get(idx + 1) {
                if is_value_text(next) {
                    if let Some(value) = last_number(next) {
                        return Some(value);
                    }
                }
            }
        }
    }
    None
}

fn is_value_text(text: &str) -> bool {
    let lower = text.to_lowercase().replace("usd", "");
    !has_letters(&lower)
}

pub fn infer_american_odds(stake: f64, profit: f64) -> Option<i64> {
    if !stake.is_finite() || !profit.is_finite() || stake <= 0.0 || profit <= 0.0 {
        return None;
    }
    if profit >= stake {
        Some((profit / stake * 100.0).round() as i64)
    } else {
        Some(-((stake / profit * 100.0).round() as i64))
    }
}

/// Rightmost nine digits of a numeric ticket; other ids are kept as printed.
pub(crate) fn normalize_ticket_no(raw: &str) -> String {
    let digits = raw.chars().filter(|ch| ch.is_ascii_digit()).collect::<String>();
    let numeric = raw.chars().all(|ch| ch.is_ascii_digit() || ch == '-');
    if numeric && digits.len() > 9 {
        digits[digits.len() - 9..].to_string()
    } else if numeric {
        digits
    } else {
        raw.to_string()
    }
}

pub(crate) fn find_ticket_no(text: &str) -> Option<String> {
    TICKET
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|found| found.as_str())
        .find(|value| value.chars().any(|ch| ch.is_ascii_digit()))
        .map(normalize_ticket_no)
}

/// A line carrying only a placement date or a ticket id, e.g.
/// `Placed Jan 5, 2025 7:30PM` or `Bet ID: 0012345678901`.
pub(crate) fn is_metadata_line(line: &str) -> bool {
    if !DATE.is_match(line) && !TICKET.is_match(line) {
        return false;
    }
    let without_date = DATE.replace_all(line, " ");
    let rest = TICKET.replace_all(&without_date, " ").to_lowercase();
    rest.split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .all(|word| METADATA_WORDS.contains(&word))
}

pub(crate) fn find_date(text: &str) -> Option<String> {
    DATE.find(text).map(|found| found.as_str().trim().to_string())
}

pub(crate) fn detect_book(text: &str, hint: Option<&str>) -> Option<String> {
    if let Some(hint) = hint.map(str::trim).filter(|value| !value.is_empty()) {
        return Some(hint.to_string());
    }
    let lower = text.to_lowercase();
    BOOKS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, name)| name.to_string())
}
