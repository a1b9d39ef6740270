use regex::Regex;
use std::sync::LazyLock;

static STAT_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(points|pts|rebounds|reb|assists|ast|yards|yds|touchdowns|tds|receptions|catches|completions|interceptions|strikeouts|hits|home runs?|rbis?|total bases|goals|shots on goal|shots|saves|threes|3-pointers?|three pointers?|3pt|blocks|steals|turnovers|tackles|sacks|aces)\b",
    )
    .expect("stat keyword regex")
});

static EVENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)[(\[{|]\s*([A-Za-z0-9][A-Za-z0-9 .'&-]*?)\s*@\s*([A-Za-z0-9][A-Za-z0-9 .'&-]*?)\s*(?:[)\]}|]|$)",
    )
    .expect("event regex")
});

static PROPER_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:[A-Z]\.){1,2}|[A-Z](?:'[A-Z])?[a-z]+(?:[A-Z][a-z]+)?(?:[-'][A-Z]?[a-z]+)*\.?)$")
        .expect("proper token regex")
});

static CAPS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z'-]*[A-Z]\.?$").expect("caps token regex"));

static PROP_KEYS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"double[ -]double", "player_double_double"),
        (r"triple[ -]double", "player_triple_double"),
        (
            r"points\s*\+\s*rebounds\s*\+\s*assists|pts\s*\+\s*reb\s*\+\s*ast|\bpra\b",
            "player_points_rebounds_assists",
        ),
        (r"points\s*\+\s*rebounds|pts\s*\+\s*reb\b", "player_points_rebounds"),
        (r"points\s*\+\s*assists|pts\s*\+\s*ast\b", "player_points_assists"),
        (r"rebounds\s*\+\s*assists|reb\s*\+\s*ast\b", "player_rebounds_assists"),
        (r"\b(threes|3-pointers?|three pointers?|3pt|3-pt)\b", "player_threes"),
        (r"rush(ing)?\s*\+\s*rec(eiving)?\s*(yards|yds)", "player_rush_reception_yds"),
        (r"pass(ing)?\s+(yards|yds)", "player_pass_yds"),
        (r"pass(ing)?\s+(touchdowns|tds)", "player_pass_tds"),
        (r"rush(ing)?\s+(yards|yds)", "player_rush_yds"),
        (r"(receiving|rec)\s+(yards|yds)", "player_reception_yds"),
        (r"\b(receptions|catches)\b", "player_receptions"),
        (r"\binterceptions\b", "player_pass_interceptions"),
        (r"\bcompletions\b", "player_pass_completions"),
        (r"\bstrikeouts\b", "pitcher_strikeouts"),
        (r"\bhome runs?\b", "batter_home_runs"),
        (r"\btotal bases\b", "batter_total_bases"),
        (r"\brbis?\b", "batter_rbis"),
        (r"\bhits\b", "batter_hits"),
        (r"\bshots on goal\b", "player_shots_on_goal"),
        (r"\bgoals\b", "player_goals"),
        (r"\bsaves\b", "player_saves"),
        (r"\b(rebounds?|reb)\b", "player_rebounds"),
        (r"\b(assists?|ast)\b", "player_assists"),
        (r"\b(points?|pts)\b", "player_points"),
        (r"\bblocks\b", "player_blocks"),
        (r"\bsteals\b", "player_steals"),
    ]
    .into_iter()
    .map(|(pattern, key)| {
        (
            Regex::new(&format!("(?i){}", pattern)).expect("prop key regex"),
            key,
        )
    })
    .collect()
});

const NON_PERSON_WORDS: &[&str] = &[
    "team", "over", "under", "yes", "no", "total", "alt", "alternate", "moneyline", "ml",
    "spread", "to", "score", "record", "anytime", "first", "td", "touchdown", "parlay", "leg",
    "legs", "odds", "wager", "win", "risk", "return", "pending", "live", "game", "half",
    "quarter", "period", "player", "prop", "props", "receiving", "rushing", "passing", "made",
    "double", "triple", "sgp", "nfl", "nba", "mlb", "nhl", "ncaaf", "ncaab", "wnba", "mls",
    "epl", "ufc", "the", "and", "or", "of", "milestones", "scorer", "straight", "bet",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMatch {
    pub text: String,
    pub away: String,
    pub home: String,
}

pub(crate) fn has_stat_keyword(text: &str) -> bool {
    STAT_KEYWORD.is_match(text)
}

/// The stat phrase a selection is about, e.g. `Receiving Yards`.
pub(crate) fn stat_phrase(text: &str) -> Option<String> {
    let found = STAT_KEYWORD.find(text)?;
    let start = text[..found.start()]
        .trim_end()
        .rsplit(' ')
        .next()
        .filter(|word| {
            matches!(
                word.to_ascii_lowercase().as_str(),
                "receiving" | "rushing" | "passing" | "total"
            )
        })
        .map_or(found.start(), |word| {
            text[..found.start()].trim_end().len() - word.len()
        });
    Some(text[start..found.end()].to_string())
}

pub fn extract_event(text: &str) -> Option<EventMatch> {
    let caps = EVENT.captures(text)?;
    let away = caps.get(1)?.as_str().trim().to_string();
    let home = caps.get(2)?.as_str().trim().to_string();
    if away.is_empty() || home.is_empty() || !away.chars().any(|ch| ch.is_alphabetic()) {
        return None;
    }
    Some(EventMatch {
        text: format!("{} @ {}", away, home),
        away,
        home,
    })
}

/// Player named on a prop selection. Only fires when a stat keyword is
/// present; capitalised phrases elsewhere are usually teams or labels.
pub fn extract_player_name(text: &str) -> Option<String> {
    if !has_stat_keyword(text) {
        return None;
    }
    let tokens = text
        .split_whitespace()
        .map(|token| token.trim_matches(|ch: char| matches!(ch, ',' | ':' | ';' | '(' | ')' | '[' | ']')))
        .collect::<Vec<_>>();

    if let Some(run) = find_name_run(&tokens, |token| PROPER_TOKEN.is_match(token)) {
        return Some(run.join(" "));
    }
    find_name_run(&tokens, |token| token.len() >= 2 && CAPS_TOKEN.is_match(token)).map(|run| {
        run.iter()
            .map(|token| title_case(token))
            .collect::<Vec<_>>()
            .join(" ")
    })
}

fn find_name_run<'a, F>(tokens: &[&'a str], is_name_token: F) -> Option<Vec<&'a str>>
where
    F: Fn(&str) -> bool,
{
    let mut run: Vec<&str> = Vec::new();
    for token in tokens.iter().copied().chain(std::iter::once("")) {
        let usable = !token.is_empty()
            && is_name_token(token)
            && !is_non_person_word(token)
            && !has_stat_keyword(token);
        if usable {
            run.push(token);
            continue;
        }
        if run.len() >= 2 {
            run.truncate(3);
            return Some(run);
        }
        run.clear();
    }
    None
}

fn is_non_person_word(token: &str) -> bool {
    let lower = token.trim_end_matches('.').to_ascii_lowercase();
    NON_PERSON_WORDS.contains(&lower.as_str())
}

/// `O'NEAL` -> `O'Neal`, `SMITH-SCHUSTER` -> `Smith-Schuster`.
fn title_case(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut start_of_word = true;
    for ch in token.chars() {
        if ch.is_alphabetic() {
            if start_of_word {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            start_of_word = false;
        } else {
            out.push(ch);
            start_of_word = true;
        }
    }
    out
}

pub fn infer_player_prop_market_key(text: &str) -> &'static str {
    PROP_KEYS
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map_or("player_props", |(_, key)| *key)
}
