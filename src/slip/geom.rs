use super::input::{Vertex, WordAnnotation};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct Point {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl Point {
    /// `(0, 0)` is what an empty polygon yields and means "position unknown".
    pub(crate) fn is_known(self) -> bool {
        !(self.x == 0.0 && self.y == 0.0)
    }
}

/// Header positions of a Risk / To Win column layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct ColumnLayout {
    pub(crate) split_x: f64,
    pub(crate) risk_x: f64,
    pub(crate) win_x: f64,
}

pub(crate) fn center_of(polygon: &[Vertex]) -> Point {
    if polygon.is_empty() {
        return Point::default();
    }
    let count = polygon.len() as f64;
    let (sum_x, sum_y) = polygon.iter().fold((0.0, 0.0), |(sx, sy), vertex| {
        (sx + vertex.x.unwrap_or(0.0), sy + vertex.y.unwrap_or(0.0))
    });
    Point {
        x: sum_x / count,
        y: sum_y / count,
    }
}

/// Individual word tokens; the first annotation is the whole-page blob.
pub(crate) fn word_tokens(annotations: &[WordAnnotation]) -> impl Iterator<Item = &WordAnnotation> {
    annotations.iter().skip(1)
}

pub(crate) fn find_word_center_x(annotations: &[WordAnnotation], word: &str) -> Option<f64> {
    word_tokens(annotations)
        .find(|token| token.description.trim().eq_ignore_ascii_case(word))
        .map(|token| center_of(&token.bounding_polygon))
        .filter(|center| center.is_known())
        .map(|center| center.x)
}

pub(crate) fn infer_column_layout(annotations: &[WordAnnotation]) -> Option<ColumnLayout> {
    let risk_x = find_word_center_x(annotations, "Risk")?;
    let win_x = find_word_center_x(annotations, "Win")
        .or_else(|| find_word_center_x(annotations, "To"))?;
    Some(ColumnLayout {
        split_x: (risk_x + win_x) / 2.0,
        risk_x,
        win_x,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn page() -> WordAnnotation {
        WordAnnotation::new("page blob", Vec::new())
    }

    #[test]
    fn center_of_averages_vertices_and_defaults_missing() {
        let center = center_of(&[
            Vertex::new(0.0, 0.0),
            Vertex { x: Some(10.0), y: None },
            Vertex::new(20.0, 30.0),
        ]);
        assert_eq!(center, Point { x: 10.0, y: 10.0 });
        assert!(!center_of(&[]).is_known());
    }

    #[test]
    fn find_word_center_skips_page_blob() {
        let annotations = vec![
            WordAnnotation::new("Risk", vec![Vertex::new(500.0, 500.0)]),
            word("risk", 100.0, 40.0),
        ];
        assert_eq!(find_word_center_x(&annotations, "RISK"), Some(100.0));
        assert_eq!(find_word_center_x(&annotations, "Win"), None);
    }

    #[test]
    fn column_split_uses_win_then_to() {
        let annotations = vec![page(), word("Risk", 300.0, 40.0), word("To", 460.0, 40.0)];
        assert_eq!(infer_column_layout(&annotations).map(|layout| layout.split_x), Some(380.0));

        let annotations = vec![
            page(),
            word("Risk", 300.0, 40.0),
            word("To", 460.0, 40.0),
            word("Win", 500.0, 40.0),
        ];
        let layout = infer_column_layout(&annotations).expect("layout");
        assert_eq!(layout.split_x, 400.0);
        assert_eq!(layout.win_x, 500.0);
    }

    #[test]
    fn column_split_requires_both_headers() {
        let annotations = vec![page(), word("Win", 460.0, 40.0)];
        assert_eq!(infer_column_layout(&annotations).map(|layout| layout.split_x), None);
    }
}
