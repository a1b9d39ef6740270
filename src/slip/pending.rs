use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::amounts::{extract_amount_candidates, AmountCandidate};
use super::details::{apply_score, attach_event, selection_bet, SPORTS};
use super::fields::normalize_ticket_no;
use super::geom::{center_of, infer_column_layout, word_tokens, ColumnLayout};
use super::input::WordAnnotation;
use super::market::classify_market;
use super::model::{BetKind, ParsedBet};
use super::score::{MISSING_RISK, MISSING_TO_WIN};
use super::text::{collapse_whitespace, has_letters, parse_number};

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\d{1,2}[.)]?\s+)?(\d{6,})\s+([A-Za-z]+)\s+([A-Za-z]{2,6})\b(.*)$")
        .expect("pending header regex")
});
static DOLLAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*(\d[\d,]*(?:\.\d{1,2})?)").expect("dollar regex"));

const MAX_SEGMENT_LINES: usize = 10;
const RISK_BAND: f64 = 220.0;
const WIN_BAND: f64 = 260.0;
const MAX_ROW_DY: f64 = 65.0;

const SECTION_WORDS: &[&str] = &[
    "description", "risk", "to", "win", "pending", "ticket", "status", "date", "type", "wagers",
    "wager", "bets", "open", "amount", "#", "my",
];

/// Ticket header row of a pending-wager list.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingHeader {
    pub(crate) ticket: String,
    pub(crate) sport: String,
    pub(crate) league: String,
    pub(crate) rest: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingSegment {
    pub(crate) header: PendingHeader,
    pub(crate) lines: Vec<String>,
}

impl PendingSegment {
    fn raw_text(&self) -> String {
        std::iter::once(self.header.rest.as_str())
            .chain(self.lines.iter().map(String::as_str))
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Description lines with dollar amounts and bracketed matchups removed.
    fn selection_text(&self) -> String {
        let parts = std::iter::once(self.header.rest.as_str())
            .chain(self.lines.iter().map(String::as_str))
            .map(|line| DOLLAR.replace_all(line, " ").to_string())
            .filter(|line| has_letters(line) && !is_matchup_line(line))
            .collect::<Vec<_>>();
        collapse_whitespace(&parts.join(" "))
    }
}

/// Segmenter states. A header moves `Scanning` to `Collecting`; the next
/// header or the end of input is the boundary that emits the segment.
#[derive(Debug, Default)]
enum SegmentState {
    #[default]
    Scanning,
    Collecting(PendingSegment),
}

impl SegmentState {
    fn step(self, line: &str) -> (Self, Option<PendingSegment>) {
        if let Some(header) = parse_header(line) {
            let next = SegmentState::Collecting(PendingSegment {
                header,
                lines: Vec::new(),
            });
            return match self {
                SegmentState::Scanning => (next, None),
                SegmentState::Collecting(done) => (next, Some(done)),
            };
        }
        match self {
            SegmentState::Scanning => (SegmentState::Scanning, None),
            SegmentState::Collecting(mut segment) => {
                if segment.lines.len() < MAX_SEGMENT_LINES && !is_section_label(line) {
                    let line = line.trim();
                    if !line.is_empty() {
                        segment.lines.push(line.to_string());
                    }
                }
                (SegmentState::Collecting(segment), None)
            }
        }
    }

    fn finish(self) -> Option<PendingSegment> {
        match self {
            SegmentState::Scanning => None,
            SegmentState::Collecting(segment) => Some(segment),
        }
    }
}

pub(crate) fn parse_header(line: &str) -> Option<PendingHeader> {
    let caps = HEADER.captures(line)?;
    let sport = caps.get(2)?.as_str();
    if !SPORTS.contains(&sport.to_ascii_lowercase().as_str()) {
        return None;
    }
    Some(PendingHeader {
        ticket: caps.get(1)?.as_str().to_string(),
        sport: sport.to_string(),
        league: caps.get(3)?.as_str().to_ascii_uppercase(),
        rest: caps.get(4).map_or("", |rest| rest.as_str()).trim().to_string(),
    })
}

fn is_section_label(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    let mut words = lower.split_whitespace().peekable();
    words.peek().is_some() && words.all(|word| SECTION_WORDS.contains(&word.trim_end_matches(':')))
}

fn is_matchup_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with(['(', '[', '{']) && trimmed.contains('@')
}

/// True when the slip reads like a list of open wagers rather than one
/// receipt.
pub(crate) fn looks_like_pending_list(text: &str) -> bool {
    let lower = text.to_lowercase();
    let has_columns =
        lower.contains("description") && lower.contains("risk") && lower.contains("to win");
    if lower.contains("pending") && has_columns {
        return true;
    }
    text.lines().filter(|line| parse_header(line).is_some()).count() >= 2
}

pub(crate) fn segment_pending_list(text: &str) -> Vec<PendingSegment> {
    let mut segments = Vec::new();
    let mut state = SegmentState::default();
    for line in text.lines() {
        let (next, emitted) = state.step(line);
        segments.extend(emitted);
        state = next;
    }
    segments.extend(state.finish());
    segments
}

/// One bet per ticket in the list. Empty when nothing could be segmented.
pub(crate) fn parse_pending_list(text: &str, annotations: &[WordAnnotation]) -> Vec<ParsedBet> {
    let segments = segment_pending_list(text);
    let candidates = extract_amount_candidates(annotations);
    let layout = infer_column_layout(annotations);
    debug!(
        "pending list: {} segment(s), {} amount candidate(s)",
        segments.len(),
        candidates.len()
    );

    segments
        .iter()
        .filter_map(|segment| {
            let selection = segment.selection_text();
            if selection.is_empty() {
                debug!("dropping pending segment {} without selection text", segment.header.ticket);
                return None;
            }
            Some(segment_bet(segment, &selection, annotations, &candidates, layout))
        })
        .collect()
}

fn segment_bet(
    segment: &PendingSegment,
    selection: &str,
    annotations: &[WordAnnotation],
    candidates: &[AmountCandidate],
    layout: Option<ColumnLayout>,
) -> ParsedBet {
    let raw = segment.raw_text();
    let mut bet = selection_bet(selection, classify_market(selection), BetKind::Single);
    attach_event(&mut bet, &raw);
    bet.sport = Some(segment.header.sport.clone());
    bet.league = Some(segment.header.league.clone());
    let ticket_no = normalize_ticket_no(&segment.header.ticket);

    let geometry = geometry_amounts(&segment.header.ticket, annotations, candidates, layout);
    let (stake, to_win) = match geometry {
        (None, None) => text_amounts(&raw),
        found => found,
    };
    bet.stake = stake;
    bet.to_win = to_win;
    bet.ticket_no = Some(ticket_no);

    apply_score(&mut bet, selection);
    if bet.stake.is_none() {
        bet.push_issue(MISSING_RISK);
    }
    if bet.to_win.is_none() {
        bet.push_issue(MISSING_TO_WIN);
    }
    bet
}

/// First two dollar amounts of the segment as (risk, to win).
fn text_amounts(raw: &str) -> (Option<f64>, Option<f64>) {
    let mut amounts = DOLLAR
        .captures_iter(raw)
        .filter_map(|caps| parse_number(caps.get(1)?.as_str()));
    (amounts.next(), amounts.next())
}

/// Vertical position of the ticket number on the image.
fn ticket_anchor_y(ticket: &str, annotations: &[WordAnnotation]) -> Option<f64> {
    let suffix = normalize_ticket_no(ticket);
    let digits_of = |token: &WordAnnotation| {
        token
            .description
            .chars()
            .filter(|ch| ch.is_ascii_digit())
            .collect::<String>()
    };
    let exact = word_tokens(annotations).find(|token| {
        let digits = digits_of(*token);
        digits.len() >= suffix.len() && normalize_ticket_no(&digits) == suffix
    });
    let partial = || {
        word_tokens(annotations).find(|token| {
            let digits = digits_of(*token);
            digits.len() >= 6 && (ticket.ends_with(&digits) || digits.ends_with(&suffix))
        })
    };
    exact
        .or_else(partial)
        .map(|token| center_of(&token.bounding_polygon))
        .filter(|center| center.is_known())
        .map(|center| center.y)
}

fn geometry_amounts(
    ticket: &str,
    annotations: &[WordAnnotation],
    candidates: &[AmountCandidate],
    layout: Option<ColumnLayout>,
) -> (Option<f64>, Option<f64>) {
    let Some(anchor_y) = ticket_anchor_y(ticket, annotations) else {
        return (None, None);
    };
    let row = candidates
        .iter()
        .filter(|candidate| (candidate.y - anchor_y).abs() <= MAX_ROW_DY)
        .collect::<Vec<_>>();
    let nearest = |in_band: &dyn Fn(&AmountCandidate) -> bool| {
        row.iter()
            .filter(|candidate| in_band(**candidate))
            .min_by(|a, b| (a.y - anchor_y).abs().total_cmp(&(b.y - anchor_y).abs()))
            .map(|candidate| candidate.value)
    };

    match layout {
        Some(layout) => (
            nearest(&|candidate: &AmountCandidate| {
                candidate.x < layout.split_x && (candidate.x - layout.risk_x).abs() <= RISK_BAND
            }),
            nearest(&|candidate: &AmountCandidate| {
                candidate.x >= layout.split_x && (candidate.x - layout.win_x).abs() <= WIN_BAND
            }),
        ),
        None => {
            let mut by_x = row;
            by_x.sort_by(|a, b| a.x.total_cmp(&b.x));
            (
                by_x.first().map(|candidate| candidate.value),
                by_x.get(1).map(|candidate| candidate.value),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slip::input::Vertex;
    use crate::slip::model::MarketKind;

    const LIST: &str = "Pending Wagers\n\
Description Risk To Win\n\
1 0012345678901 Football NFL\n\
Kansas City Chiefs -3.5 @ -110\n\
(Kansas City Chiefs @ Buffalo Bills)\n\
$110.00 $100.00\n\
2 0012345678902 Basketball NBA\n\
Nikola Jokic Over 11.5 Rebounds\n\
$25.00\n";

    fn word(text: &str, x: f64, y: f64) -> WordAnnotation {
        WordAnnotation::new(
            text,
            vec![
                Vertex::new(x - 10.0, y - 5.0),
                Vertex::new(x + 10.0, y - 5.0),
                Vertex::new(x + 10.0, y + 5.0),
                Vertex::new(x - 10.0, y + 5.0),
            ],
        )
    }

    #[test]
    fn header_needs_ticket_and_sport() {
        let header = parse_header("1 0012345678901 Football NFL").expect("header");
        assert_eq!(header.ticket, "0012345678901");
        assert_eq!(header.sport, "Football");
        assert_eq!(header.league, "NFL");
        assert!(parse_header("0012345678901 Chiefs ML").is_none());
        assert!(parse_header("12345 Football NFL").is_none());
    }

    #[test]
    fn list_detection() {
        assert!(looks_like_pending_list(LIST));
        assert!(!looks_like_pending_list("Chiefs ML\nWager: $10"));
        assert!(looks_like_pending_list(
            "123456 Hockey NHL\nBruins ML\n654321 Hockey NHL\nRangers ML"
        ));
    }

    #[test]
    fn segments_split_on_headers_and_skip_labels() {
        let segments = segment_pending_list(LIST);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].lines.len(), 3);
        assert_eq!(segments[0].selection_text(), "Kansas City Chiefs -3.5 @ -110");
        assert_eq!(segments[1].header.league, "NBA");
    }

    #[test]
    fn segment_is_capped() {
        let mut text = String::from("123456789 Golf PGA\n");
        for idx in 0..15 {
            text.push_str(&format!("line {}\n", idx));
        }
        let segments = segment_pending_list(&text);
        assert_eq!(segments[0].lines.len(), MAX_SEGMENT_LINES);
    }

    #[test]
    fn text_amounts_fill_risk_then_to_win() {
        let bets = parse_pending_list(LIST, &[]);
        assert_eq!(bets.len(), 2);

        let first = &bets[0];
        assert_eq!(first.stake, Some(110.0));
        assert_eq!(first.to_win, Some(100.0));
        assert_eq!(first.ticket_no.as_deref(), Some("345678901"));
        assert_eq!(first.market_type.kind, MarketKind::Spread);
        assert_eq!(first.event.as_deref(), Some("Kansas City Chiefs @ Buffalo Bills"));
        assert_eq!(first.sport.as_deref(), Some("Football"));
        assert!(!first.has_issue(MISSING_RISK));

        let second = &bets[1];
        assert_eq!(second.stake, Some(25.0));
        assert_eq!(second.to_win, None);
        assert!(second.has_issue(MISSING_TO_WIN));
        assert!(!second.has_issue(MISSING_RISK));
    }

    #[test]
    fn segment_without_description_is_dropped() {
        let bets = parse_pending_list("123456789 Football NFL\n$10.00 $9.09\n", &[]);
        assert!(bets.is_empty());
    }

    #[test]
    fn geometry_uses_column_bands() {
        let text = "Pending\nDescription Risk To Win\n\
1 0012345678901 Football NFL\nChiefs ML\n";
        let annotations = vec![
            word(text, 0.0, 0.0),
            word("Risk", 400.0, 50.0),
            word("To", 560.0, 50.0),
            word("Win", 600.0, 50.0),
            word("0012345678901", 100.0, 100.0),
            word("$", 380.0, 110.0),
            word("150.00", 420.0, 110.0),
            word("$", 580.0, 110.0),
            word("125.00", 620.0, 110.0),
            word("$", 380.0, 400.0),
            word("999.00", 420.0, 400.0),
        ];
        let bets = parse_pending_list(text, &annotations);
        assert_eq!(bets.len(), 1);
        assert_eq!(bets[0].stake, Some(150.0));
        assert_eq!(bets[0].to_win, Some(125.0));
    }

    #[test]
    fn ticket_with_lost_leading_digits_still_anchors_row() {
        let text = "Pending\nDescription Risk To Win\n\
1 0012345678901 Football NFL\nChiefs ML\n";
        let annotations = vec![
            word(text, 0.0, 0.0),
            word("Risk", 400.0, 50.0),
            word("Win", 600.0, 50.0),
            word("5678901", 100.0, 300.0),
            word("$", 380.0, 305.0),
            word("40.00", 420.0, 305.0),
            word("$", 580.0, 305.0),
            word("36.36", 620.0, 305.0),
        ];
        assert_eq!(ticket_anchor_y("0012345678901", &annotations), Some(300.0));

        let bets = parse_pending_list(text, &annotations);
        assert_eq!(bets[0].stake, Some(40.0));
        assert_eq!(bets[0].to_win, Some(36.36));
        assert_eq!(bets[0].ticket_no.as_deref(), Some("345678901"));
    }

    #[test]
    fn amount_outside_risk_band_is_not_the_stake() {
        let text = "Pending\nDescription Risk To Win\n\
1 0012345678901 Football NFL\nChiefs ML\n";
        let annotations = vec![
            word(text, 0.0, 0.0),
            word("Risk", 400.0, 50.0),
            word("Win", 600.0, 50.0),
            word("0012345678901", 60.0, 100.0),
            // same row as the ticket but 250px left of the Risk header
            word("$", 130.0, 100.0),
            word("80.00", 150.0, 100.0),
            word("$", 380.0, 112.0),
            word("150.00", 420.0, 112.0),
            word("$", 580.0, 112.0),
            word("125.00", 620.0, 112.0),
        ];
        let bets = parse_pending_list(text, &annotations);
        assert_eq!(bets[0].stake, Some(150.0));
        assert_eq!(bets[0].to_win, Some(125.0));

        let far_only = annotations
            .iter()
            .filter(|token| token.description != "150.00")
            .cloned()
            .collect::<Vec<_>>();
        let bets = parse_pending_list(text, &far_only);
        assert_eq!(bets[0].stake, None);
        assert_eq!(bets[0].to_win, Some(125.0));
        assert!(bets[0].has_issue(MISSING_RISK));
    }
}
