use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::geom::{center_of, word_tokens, Point};
use super::input::WordAnnotation;
use super::text::parse_number;

static MONEY_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,5}(?:\.\d{2})?$").expect("money number regex"));
static DOLLAR_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[$S](\d{1,5}(?:\.\d{2})?)$").expect("dollar amount regex"));
static PLAIN_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d{1,2})?$").expect("plain number regex"));

const MAX_PAIR_DY: f64 = 35.0;
const MAX_PAIR_DX: f64 = 220.0;
const MAX_PLAUSIBLE_AMOUNT: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AmountCandidate {
    pub(crate) value: f64,
    pub(crate) x: f64,
    pub(crate) y: f64,
}

struct PositionedToken {
    text: String,
    center: Point,
}

fn positioned_tokens(annotations: &[WordAnnotation]) -> Vec<PositionedToken> {
    word_tokens(annotations)
        .map(|token| PositionedToken {
            text: token.description.trim().replace(',', ""),
            center: center_of(&token.bounding_polygon),
        })
        .filter(|token| token.center.is_known() && !token.text.is_empty())
        .collect()
}

/// Dollar amounts on the slip image, with positions.
///
/// `$` tokens are paired with the nearest number to their right on the same
/// row. When OCR dropped every `$` (coloured text is a common cause) each
/// plausible standalone number becomes a candidate instead.
pub(crate) fn extract_amount_candidates(annotations: &[WordAnnotation]) -> Vec<AmountCandidate> {
    let tokens = positioned_tokens(annotations);
    let symbols = tokens
        .iter()
        .filter(|token| token.text == "$")
        .collect::<Vec<_>>();
    let numbers = tokens
        .iter()
        .filter(|token| MONEY_NUMBER.is_match(&token.text))
        .collect::<Vec<_>>();

    let mut candidates = Vec::new();
    for symbol in &symbols {
        let best = numbers
            .iter()
            .filter_map(|number| {
                let dx = number.center.x - symbol.center.x;
                let dy = (number.center.y - symbol.center.y).abs();
                (dx > 0.0 && dx < MAX_PAIR_DX && dy < MAX_PAIR_DY).then_some((dx, *number))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0));
        if let Some((_, number)) = best {
            if let Some(value) = parse_number(&number.text) {
                candidates.push(AmountCandidate {
                    value,
                    x: number.center.x,
                    y: number.center.y,
                });
            }
        }
    }

    // OCR often reads a fused `$` as `S`, as in `S110.00`.
    for token in &tokens {
        let Some(caps) = DOLLAR_AMOUNT.captures(&token.text) else {
            continue;
        };
        if let Some(value) = caps.get(1).and_then(|digits| parse_number(digits.as_str())) {
            candidates.push(AmountCandidate {
                value,
                x: token.center.x,
                y: token.center.y,
            });
        }
    }

    if !candidates.is_empty() {
        return candidates;
    }

    debug!("no $ pairs found, falling back to standalone numbers");
    tokens
        .iter()
        .filter(|token| PLAIN_NUMBER.is_match(&token.text))
        .filter(|token| {
            let integer_digits = token.text.split('.').next().map_or(0, str::len);
            integer_digits < 6
        })
        .filter_map(|token| {
            let value = parse_number(&token.text)?;
            (value > 0.0 && value <= MAX_PLAUSIBLE_AMOUNT).then_some(AmountCandidate {
                value,
                x: token.center.x,
                y: token.center.y,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slip::input::Vertex;

    fn word(text: &str, x: f64, y: f64) -> WordAnnotation {
        WordAnnotation::new(text, vec![Vertex::new(x, y)])
    }

    fn page() -> WordAnnotation {
        WordAnnotation::new("page", Vec::new())
    }

    #[test]
    fn pairs_dollar_sign_with_nearest_number_on_row() {
        let annotations = vec![
            page(),
            word("$", 100.0, 50.0),
            word("25.00", 130.0, 52.0),
            word("99.00", 200.0, 50.0),
            word("$", 400.0, 50.0),
            word("47.50", 420.0, 49.0),
            word("12.00", 115.0, 120.0),
        ];
        let amounts = extract_amount_candidates(&annotations);
        assert_eq!(
            amounts,
            vec![
                AmountCandidate { value: 25.0, x: 130.0, y: 52.0 },
                AmountCandidate { value: 47.5, x: 420.0, y: 49.0 },
            ]
        );
    }

    #[test]
    fn number_left_of_symbol_is_not_paired() {
        let annotations = vec![page(), word("$", 100.0, 50.0), word("25.00", 80.0, 50.0)];
        let amounts = extract_amount_candidates(&annotations);
        // no pair, so the fallback keeps the standalone number
        assert_eq!(amounts, vec![AmountCandidate { value: 25.0, x: 80.0, y: 50.0 }]);
    }

    #[test]
    fn fallback_skips_ticket_numbers_and_implausible_values() {
        let annotations = vec![
            page(),
            word("123456789", 50.0, 40.0),
            word("10.00", 300.0, 40.0),
            word("25000", 300.0, 90.0),
            word("0", 300.0, 140.0),
            word("Chiefs", 100.0, 40.0),
        ];
        let amounts = extract_amount_candidates(&annotations);
        assert_eq!(amounts, vec![AmountCandidate { value: 10.0, x: 300.0, y: 40.0 }]);
    }

    #[test]
    fn joined_dollar_tokens_are_candidates() {
        let annotations = vec![page(), word("$1,250.00", 300.0, 40.0)];
        let amounts = extract_amount_candidates(&annotations);
        assert_eq!(amounts, vec![AmountCandidate { value: 1250.0, x: 300.0, y: 40.0 }]);
    }

    #[test]
    fn dollar_misread_as_s_is_a_candidate() {
        let annotations = vec![page(), word("S110.00", 300.0, 40.0), word("Spread", 100.0, 40.0)];
        let amounts = extract_amount_candidates(&annotations);
        assert_eq!(amounts, vec![AmountCandidate { value: 110.0, x: 300.0, y: 40.0 }]);
    }
}
