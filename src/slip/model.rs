use serde::{Serialize, Serializer};
use std::fmt;

pub const PARSER_VERSION: &str = concat!("slip-ocr/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MarketKind {
    Moneyline,
    Spread,
    Total,
    TeamTotal,
    PlayerProp,
    GameProp,
    FirstTd,
    AnytimeTd,
    AltLine,
    Future,
    #[default]
    Other,
    Parlay,
}

impl MarketKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MarketKind::Moneyline => "moneyline",
            MarketKind::Spread => "spread",
            MarketKind::Total => "total",
            MarketKind::TeamTotal => "team_total",
            MarketKind::PlayerProp => "player_prop",
            MarketKind::GameProp => "game_prop",
            MarketKind::FirstTd => "first_td",
            MarketKind::AnytimeTd => "anytime_td",
            MarketKind::AltLine => "alt_line",
            MarketKind::Future => "future",
            MarketKind::Other => "other",
            MarketKind::Parlay => "parlay",
        }
    }
}

/// Market category of a selection. Parlay legs carry the `_parlay` variant of
/// their base kind (`spread_parlay`, `player_prop_parlay`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MarketType {
    pub kind: MarketKind,
    pub in_parlay: bool,
}

impl MarketType {
    pub const fn plain(kind: MarketKind) -> Self {
        Self {
            kind,
            in_parlay: false,
        }
    }

    /// Unclassified selections collapse to the bare `parlay` bucket.
    pub fn into_parlay(self) -> Self {
        match self.kind {
            MarketKind::Other | MarketKind::Parlay => Self::plain(MarketKind::Parlay),
            kind => Self {
                kind,
                in_parlay: true,
            },
        }
    }

    pub fn is_unknown(self) -> bool {
        matches!(self.kind, MarketKind::Other | MarketKind::Parlay)
    }
}

impl From<MarketKind> for MarketType {
    fn from(kind: MarketKind) -> Self {
        Self::plain(kind)
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.in_parlay {
            write!(f, "{}_parlay", self.kind.as_str())
        } else {
            f.write_str(self.kind.as_str())
        }
    }
}

impl Serialize for MarketType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Over,
    Under,
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BetKind {
    #[default]
    Single,
    ParlayLeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BetStyle {
    Single,
    Parlay,
    #[default]
    Unknown,
}

/// Pipeline that produced a slip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsePath {
    PendingList,
    Parlay,
    Single,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParsedBet {
    pub kind: BetKind,
    pub sport: Option<String>,
    pub league: Option<String>,
    pub event: Option<String>,
    pub event_date: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub market_type: MarketType,
    pub market_key: String,
    pub market_text: String,
    pub selection_text: String,
    pub player: Option<String>,
    pub stat: Option<String>,
    pub period: Option<String>,
    pub line: Option<f64>,
    pub side: Option<Side>,
    pub team: Option<String>,
    pub odds_american: Option<i64>,
    pub stake: Option<f64>,
    pub to_win: Option<f64>,
    pub ticket_no: Option<String>,
    pub is_alt: bool,
    pub is_live: bool,
    pub confidence: f64,
    pub issues: Vec<String>,
}

impl ParsedBet {
    pub fn has_issue(&self, issue: &str) -> bool {
        self.issues.iter().any(|value| value == issue)
    }

    pub(crate) fn push_issue(&mut self, issue: &str) {
        if !self.has_issue(issue) {
            self.issues.push(issue.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlipMeta {
    pub parser_version: String,
    pub source: String,
    pub mode: ParsePath,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedSlip {
    pub book: Option<String>,
    pub ticket_no: Option<String>,
    pub placed_at: Option<String>,
    pub wager: Option<f64>,
    pub to_win: Option<f64>,
    pub odds_american: Option<i64>,
    pub currency: String,
    pub bet_style: BetStyle,
    pub legs_count: usize,
    pub bets: Vec<ParsedBet>,
    pub meta: SlipMeta,
}
