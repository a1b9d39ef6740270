//! Turns OCR output of a sportsbook bet slip into structured wagers.
//!
//! [`parse_slip`] never fails. Anything it cannot read is reported through
//! each bet's `confidence` and `issues` instead.

mod amounts;
mod details;
mod extract;
mod fields;
mod geom;
mod input;
mod market;
pub mod model;
mod parlay;
mod pending;
pub mod score;
mod text;

use tracing::{debug, info};

pub use extract::{extract_event, extract_player_name, infer_player_prop_market_key, EventMatch};
pub use fields::infer_american_odds;
pub use input::{
    decode_payload, FullTextAnnotation, OcrInput, OcrPayload, ParseMode, ParseOptions, Vertex,
    WordAnnotation,
};
pub use market::{classify_market, classify_side, market_key};
pub use model::{
    BetKind, BetStyle, MarketKind, MarketType, ParsePath, ParsedBet, ParsedSlip, Side, SlipMeta,
    PARSER_VERSION,
};
pub use score::{score, Score};

use details::{apply_score, attach_event, selection_bet};
use fields::{detect_book, find_date, find_ticket_no, is_field_label_line, parse_slip_fields};
use input::normalize;
use parlay::{header_odds, looks_like_parlay, parse_parlay};
use pending::{looks_like_pending_list, parse_pending_list};
use score::{
    clamp_confidence, EMPTY_INPUT, FALLBACK_PENALTY, MISSING_RISK, MISSING_TO_WIN, NEEDS_REVIEW,
    PARLAY_DETECTED, PENDING_LIST_UNPARSED, TO_WIN_IS_RETURN,
};
use text::{collapse_whitespace, find_selection_odds, has_letters};

const CURRENCY: &str = "USD";
const SOURCE: &str = "ocr";

/// Pipeline for a slip: an explicit pending-list mode wins, then the
/// pending-list shape (unless reading a receipt), then parlay wording.
fn select_path(text: &str, mode: ParseMode) -> ParsePath {
    match mode {
        ParseMode::PendingList => ParsePath::PendingList,
        ParseMode::Auto if looks_like_pending_list(text) => ParsePath::PendingList,
        _ if looks_like_parlay(text) => ParsePath::Parlay,
        _ => ParsePath::Single,
    }
}

pub fn parse_slip(input: OcrInput, options: &ParseOptions) -> ParsedSlip {
    let normalized = normalize(input);
    let text = normalized.text.as_str();
    let lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();
    let fields = parse_slip_fields(&lines);
    if fields.odds_inferred {
        debug!(
            "odds {:?} inferred from wager {:?} and to win {:?}",
            fields.odds_american, fields.wager, fields.to_win
        );
    }
    let path = select_path(text, options.mode);
    info!(
        "parsing slip: mode={} path={:?} lines={} annotations={}",
        options.mode.as_str(),
        path,
        lines.len(),
        normalized.annotations.len()
    );

    let mut slip = ParsedSlip {
        book: detect_book(text, options.book_hint.as_deref()),
        ticket_no: find_ticket_no(text),
        placed_at: find_date(text),
        wager: fields.wager,
        to_win: fields.to_win,
        odds_american: fields.odds_american,
        currency: CURRENCY.to_string(),
        bet_style: BetStyle::Unknown,
        legs_count: 0,
        bets: Vec::new(),
        meta: SlipMeta {
            parser_version: PARSER_VERSION.to_string(),
            source: SOURCE.to_string(),
            mode: path,
        },
    };

    match path {
        ParsePath::PendingList => fill_pending_list(&mut slip, text, &normalized.annotations),
        ParsePath::Parlay => fill_parlay(&mut slip, text),
        ParsePath::Single => fill_single(&mut slip, text, &lines),
    }
    if fields.to_win_is_return && slip.to_win == fields.to_win {
        for bet in &mut slip.bets {
            bet.push_issue(TO_WIN_IS_RETURN);
        }
    }
    debug!(
        "parsed {} bet(s), style={:?}, legs={}",
        slip.bets.len(),
        slip.bet_style,
        slip.legs_count
    );
    slip
}

fn fill_pending_list(slip: &mut ParsedSlip, text: &str, annotations: &[WordAnnotation]) {
    let bets = parse_pending_list(text, annotations);
    if bets.is_empty() {
        debug!("pending list yielded no segments");
        push_fallback(slip, text, &[PENDING_LIST_UNPARSED, NEEDS_REVIEW]);
        return;
    }

    if let [only] = bets.as_slice() {
        slip.wager = only.stake;
        slip.to_win = only.to_win;
        slip.odds_american = only.odds_american;
        slip.ticket_no = only.ticket_no.clone();
    } else {
        slip.wager = None;
        slip.to_win = None;
        slip.odds_american = None;
    }
    slip.bet_style = BetStyle::Single;
    slip.legs_count = bets.len();
    slip.bets = bets;
}

fn fill_parlay(slip: &mut ParsedSlip, text: &str) {
    let outcome = parse_parlay(text);
    if slip.odds_american.is_none() {
        slip.odds_american = header_odds(text);
    }
    if outcome.bets.is_empty() {
        push_fallback(slip, text, &[PARLAY_DETECTED, NEEDS_REVIEW]);
        return;
    }

    let combined = outcome.bets.len() == 1;
    slip.bet_style = BetStyle::Parlay;
    slip.legs_count = outcome.legs_count;
    slip.bets = outcome.bets;
    if combined {
        let (wager, to_win) = (slip.wager, slip.to_win);
        for bet in &mut slip.bets {
            set_amounts(bet, wager, to_win);
        }
    }
}

/// Lines that name a wager of their own.
fn selection_lines<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    lines
        .iter()
        .copied()
        .filter(|line| has_letters(line) && !is_field_label_line(line))
        .filter(|line| {
            let trimmed = line.trim_start();
            !(trimmed.starts_with(['(', '[', '{']) && extract_event(trimmed).is_some())
        })
        .filter(|line| !classify_market(line).is_unknown() || find_selection_odds(line).is_some())
        .collect()
}

fn fill_single(slip: &mut ParsedSlip, text: &str, lines: &[&str]) {
    let selections = selection_lines(lines);
    match selections.as_slice() {
        [] => push_fallback(slip, text, &[NEEDS_REVIEW]),
        [selection] => {
            let mut bet = selection_bet(selection, classify_market(selection), BetKind::Single);
            if bet.odds_american.is_none() {
                bet.odds_american = slip.odds_american;
            }
            if slip.odds_american.is_none() {
                slip.odds_american = bet.odds_american;
            }
            attach_event(&mut bet, text);
            bet.ticket_no = slip.ticket_no.clone();
            apply_score(&mut bet, selection);
            set_amounts(&mut bet, slip.wager, slip.to_win);
            slip.bet_style = BetStyle::Single;
            slip.legs_count = 1;
            slip.bets = vec![bet];
        }
        many => {
            debug!("{} selection lines, reading as parlay legs", many.len());
            slip.bets = many
                .iter()
                .map(|selection| {
                    let market = classify_market(selection).into_parlay();
                    let mut bet = selection_bet(selection, market, BetKind::ParlayLeg);
                    apply_score(&mut bet, selection);
                    bet
                })
                .collect();
            slip.bet_style = BetStyle::Parlay;
            slip.legs_count = many.len();
        }
    }
}

fn set_amounts(bet: &mut ParsedBet, wager: Option<f64>, to_win: Option<f64>) {
    bet.stake = wager;
    bet.to_win = to_win;
    if wager.is_none() {
        bet.push_issue(MISSING_RISK);
    }
    if to_win.is_none() {
        bet.push_issue(MISSING_TO_WIN);
    }
}

/// Stand-in bet covering the whole slip when nothing could be segmented.
fn push_fallback(slip: &mut ParsedSlip, text: &str, issues: &[&str]) {
    let selection = collapse_whitespace(text);
    let mut bet = selection_bet(&selection, MarketType::default(), BetKind::Single);
    if bet.odds_american.is_none() {
        bet.odds_american = slip.odds_american;
    }
    attach_event(&mut bet, text);
    bet.ticket_no = slip.ticket_no.clone();
    apply_score(&mut bet, &selection);
    bet.confidence = clamp_confidence(bet.confidence - FALLBACK_PENALTY);
    if selection.is_empty() {
        bet.push_issue(EMPTY_INPUT);
    }
    for issue in issues {
        bet.push_issue(issue);
    }
    bet.push_issue(NEEDS_REVIEW);
    set_amounts(&mut bet, slip.wager, slip.to_win);

    slip.bet_style = BetStyle::Unknown;
    slip.legs_count = 1;
    slip.bets = vec![bet];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> ParsedSlip {
        parse_slip(OcrInput::from(text), &ParseOptions::default())
    }

    #[test]
    fn single_receipt_with_inferred_odds() {
        let slip = parse(
            "DraftKings Sportsbook\nKansas City Chiefs Moneyline\n(Kansas City Chiefs @ Buffalo Bills)\nWager: $10.00\nTo Win: $237.00",
        );
        assert_eq!(slip.meta.mode, ParsePath::Single);
        assert_eq!(slip.book.as_deref(), Some("DraftKings"));
        assert_eq!(slip.odds_american, Some(2370));
        assert_eq!(slip.bet_style, BetStyle::Single);
        assert_eq!(slip.legs_count, 1);

        let bet = &slip.bets[0];
        assert_eq!(bet.market_type.kind, MarketKind::Moneyline);
        assert_eq!(bet.team.as_deref(), Some("Kansas City Chiefs"));
        assert_eq!(bet.event.as_deref(), Some("Kansas City Chiefs @ Buffalo Bills"));
        assert_eq!(bet.stake, Some(10.0));
        assert_eq!(bet.to_win, Some(237.0));
        assert_eq!(bet.odds_american, Some(2370));
        assert!(bet.issues.is_empty());
        assert_eq!(bet.confidence, 0.85);
    }

    #[test]
    fn two_selection_lines_read_as_legs() {
        let slip = parse("Chiefs ML -150\nBills -3.5\nWager: $10");
        assert_eq!(slip.bet_style, BetStyle::Parlay);
        assert_eq!(slip.legs_count, 2);
        assert_eq!(slip.bets[0].market_type.to_string(), "moneyline_parlay");
        assert_eq!(slip.bets[1].market_type.to_string(), "spread_parlay");
        assert!(slip.bets.iter().all(|bet| bet.kind == BetKind::ParlayLeg));
    }

    #[test]
    fn receipt_mode_skips_pending_heuristic() {
        let text = "123456789 Football NFL\nChiefs ML\n987654321 Football NFL\nBills ML";
        assert_eq!(parse(text).meta.mode, ParsePath::PendingList);
        let options = ParseOptions {
            mode: ParseMode::Receipt,
            ..ParseOptions::default()
        };
        let slip = parse_slip(OcrInput::from(text), &options);
        assert_eq!(slip.meta.mode, ParsePath::Single);
    }

    #[test]
    fn explicit_pending_mode_without_rows_falls_back() {
        let options = ParseOptions {
            mode: ParseMode::PendingList,
            ..ParseOptions::default()
        };
        let slip = parse_slip(OcrInput::from("Bet Placed"), &options);
        assert_eq!(slip.bets.len(), 1);
        assert_eq!(slip.bet_style, BetStyle::Unknown);
        let bet = &slip.bets[0];
        assert!(bet.has_issue(PENDING_LIST_UNPARSED));
        assert!(bet.has_issue(NEEDS_REVIEW));
        assert!(bet.confidence <= 0.35);
    }

    #[test]
    fn empty_input_still_yields_a_bet() {
        let slip = parse("");
        assert_eq!(slip.bets.len(), 1);
        assert_eq!(slip.bet_style, BetStyle::Unknown);
        assert!(slip.bets[0].has_issue(EMPTY_INPUT));
        assert_eq!(slip.bets[0].confidence, 0.2);
    }

    #[test]
    fn unconverted_return_is_flagged() {
        let slip = parse("Chiefs ML -150\nReturn: $25.00");
        assert_eq!(slip.to_win, Some(25.0));
        assert_eq!(slip.bets.len(), 1);
        assert_eq!(slip.bets[0].to_win, Some(25.0));
        assert!(slip.bets[0].has_issue(TO_WIN_IS_RETURN));
        assert!(slip.bets[0].has_issue(MISSING_RISK));
    }

    #[test]
    fn book_hint_wins() {
        let options = ParseOptions {
            book_hint: Some("Caesars".to_string()),
            ..ParseOptions::default()
        };
        let slip = parse_slip(OcrInput::from("FanDuel\nChiefs ML"), &options);
        assert_eq!(slip.book.as_deref(), Some("Caesars"));
    }

    #[test]
    fn multi_ticket_list_has_no_slip_totals() {
        let slip = parse(
            "Pending\nDescription Risk To Win\n111111111 Football NFL\nChiefs ML\n$10.00 $8.00\n222222222 Hockey NHL\nBruins ML\n$5.00 $6.00",
        );
        assert_eq!(slip.bets.len(), 2);
        assert_eq!(slip.bet_style, BetStyle::Single);
        assert_eq!(slip.wager, None);
        assert_eq!(slip.bets[1].league.as_deref(), Some("NHL"));
        assert_eq!(slip.bets[1].to_win, Some(6.0));
    }
}
