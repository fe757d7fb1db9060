//! Anchored extraction engine: correlate candidate values with candidate
//! label anchors by two-dimensional distance in the reconstructed text, and
//! the shared context/result types the field extractors and aggregator
//! build on.

pub mod anchors;
pub mod aggregator;
pub mod extractors;

use regex::Regex;

use crate::locale::Locale;

/// A position in `text`, derived from a precomputed vector of line-start
/// offsets. Two positions are on the same line iff `line` is equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
    pub end_column: usize,
    pub char_index: usize,
}

/// Precomputed line-start offsets (in chars) for a text body, shared by
/// every anchor/value match that needs to locate itself in two dimensions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    total_chars: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0usize];
        let mut count = 0usize;
        for ch in text.chars() {
            count += 1;
            if ch == '\n' {
                line_starts.push(count);
            }
        }
        Self {
            line_starts,
            total_chars: count,
        }
    }

    /// Locate `char_index` and produce the `TextPosition` of a match of the
    /// given `length` starting there.
    pub fn position_of(&self, char_index: usize, length: usize) -> TextPosition {
        // `partition_point` returns the first index whose line start is
        // strictly greater than `char_index`; the line containing it is one
        // before that.
        let line = self
            .line_starts
            .partition_point(|&start| start <= char_index)
            .saturating_sub(1);
        let column = char_index - self.line_starts[line];
        TextPosition {
            line,
            column,
            end_column: column + length,
            char_index,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn total_chars(&self) -> usize {
        self.total_chars
    }
}

/// Relative placement of a value to its best anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorPosition {
    None,
    Left,
    Right,
    Above,
    Below,
    Any,
}

/// A labeled regex whose position near a candidate value confers additional
/// confidence (votes). Anchors are grouped by field and are static
/// configuration.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub pattern: Regex,
    pub bonus_votes: i32,
    pub description: &'static str,
}

/// A match of an anchor pattern, with its position and original matched
/// text.
#[derive(Debug, Clone)]
pub struct FoundAnchor<'a> {
    pub anchor: &'a Anchor,
    pub position: TextPosition,
    pub matched_text: String,
}

/// A match of a value pattern, with its position and original matched text.
#[derive(Debug, Clone)]
pub struct FoundValue {
    pub position: TextPosition,
    pub matched_text: String,
}

/// A value match correlated with its best-scoring anchor.
#[derive(Debug, Clone)]
pub struct AnchoredMatch {
    pub value: String,
    pub base_votes: i32,
    pub anchor_bonus: i32,
    pub anchor_matched: Option<String>,
    pub position: AnchorPosition,
    pub distance: usize,
    pub matched_text: String,
    pub value_position: TextPosition,
}

impl AnchoredMatch {
    pub fn total_votes(&self) -> i32 {
        self.base_votes + self.anchor_bonus
    }
}

/// `{value, votes, matched_text}`; a distinguished [`ExtractionResult::no_match`]
/// carries `votes = 0` and an empty value.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub value: Option<String>,
    pub votes: i32,
    pub matched_text: Option<String>,
}

impl ExtractionResult {
    pub fn no_match() -> Self {
        Self::default()
    }

    pub fn new(value: impl Into<String>, votes: i32, matched_text: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            votes,
            matched_text: Some(matched_text.into()),
        }
    }

    pub fn is_match(&self) -> bool {
        self.value.is_some() && self.votes > 0
    }
}

impl From<&AnchoredMatch> for ExtractionResult {
    fn from(m: &AnchoredMatch) -> Self {
        ExtractionResult::new(m.value.clone(), m.total_votes(), m.matched_text.clone())
    }
}

/// Immutable per-call extraction context: the document text, its
/// precomputed line splits/index, the detected locale, and optional
/// email-envelope hints threaded through to the vendor resolver.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    pub text: String,
    pub lines: Vec<String>,
    pub line_index: LineIndex,
    pub locale: Locale,
    pub sender_hint: Option<String>,
    pub email_body_hint: Option<String>,
    pub email_subject: Option<String>,
}

impl ExtractionContext {
    pub fn new(text: impl Into<String>, locale: Locale) -> Self {
        let text = text.into();
        let lines = text.lines().map(|l| l.to_string()).collect();
        let line_index = LineIndex::new(&text);
        Self {
            text,
            lines,
            line_index,
            locale,
            sender_hint: None,
            email_body_hint: None,
            email_subject: None,
        }
    }

    pub fn with_sender_hint(mut self, hint: impl Into<String>) -> Self {
        self.sender_hint = Some(hint.into());
        self
    }

    pub fn with_email_body_hint(mut self, hint: impl Into<String>) -> Self {
        self.email_body_hint = Some(hint.into());
        self
    }

    pub fn with_email_subject(mut self, subject: impl Into<String>) -> Self {
        self.email_subject = Some(subject.into());
        self
    }

    /// A sibling context with the same locale and hints but a new text body.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        let mut ctx = Self::new(text, self.locale);
        ctx.sender_hint = self.sender_hint.clone();
        ctx.email_body_hint = self.email_body_hint.clone();
        ctx.email_subject = self.email_subject.clone();
        ctx
    }
}

/// Every field extractor implements this interface; the aggregator drives
/// it uniformly across (variant x extractor) pairs.
pub trait FieldExtractor {
    fn name(&self) -> &'static str;
    fn extract(&self, ctx: &ExtractionContext) -> ExtractionResult;
    fn extract_all(&self, ctx: &ExtractionContext) -> Vec<ExtractionResult>;
}

fn char_distance(a: &TextPosition, b: &TextPosition) -> usize {
    a.char_index.abs_diff(b.char_index)
}

/// Relative position and distance of `value` with respect to `anchor`, per
/// the component design's positional rules. Returns `None` if no relation
/// is established.
fn relate(anchor: &TextPosition, value: &TextPosition) -> Option<(AnchorPosition, usize)> {
    if anchor.line == value.line {
        if anchor.end_column <= value.column {
            let delta = value.column - anchor.end_column;
            if delta <= 30 {
                return Some((AnchorPosition::Left, delta));
            }
        }
        if value.end_column <= anchor.column {
            let delta = anchor.column - value.end_column;
            if delta <= 30 {
                return Some((AnchorPosition::Right, delta));
            }
        }
    }

    let line_delta = anchor.line.abs_diff(value.line);
    if line_delta <= 2 {
        let aligned = anchor.column.abs_diff(value.column) <= 10
            || anchor.end_column.abs_diff(value.column) <= 10;
        if aligned {
            return Some(if value.line > anchor.line {
                (AnchorPosition::Above, line_delta)
            } else {
                (AnchorPosition::Below, line_delta)
            });
        }
    }

    let distance = char_distance(anchor, value);
    if distance <= 90 {
        return Some((AnchorPosition::Any, distance));
    }

    None
}

/// Bonus multiplier for a given relation, applied to the anchor's configured
/// `bonus_votes` and rounded to the nearest integer.
fn bonus_for(position: AnchorPosition, distance: usize) -> f64 {
    match position {
        AnchorPosition::Left => {
            if distance <= 3 {
                1.0
            } else {
                (1.0 - distance as f64 / 30.0).max(0.5)
            }
        }
        AnchorPosition::Above => {
            if distance == 1 {
                0.9
            } else {
                0.7
            }
        }
        AnchorPosition::Right => 0.4,
        AnchorPosition::Below => 0.3,
        AnchorPosition::Any => 0.3,
        AnchorPosition::None => 0.0,
    }
}

/// Collect all matches of `anchors` against `text`.
fn collect_anchor_matches<'a>(text: &str, anchors: &'a [Anchor], index: &LineIndex) -> Vec<FoundAnchor<'a>> {
    let mut found = Vec::new();
    for anchor in anchors {
        for m in anchor.pattern.find_iter(text) {
            let char_index = text[..m.start()].chars().count();
            let length = text[m.start()..m.end()].chars().count();
            found.push(FoundAnchor {
                anchor,
                position: index.position_of(char_index, length),
                matched_text: m.as_str().to_string(),
            });
        }
    }
    found
}

/// All value-pattern matches of `value_pattern` in `text`.
fn collect_value_matches(text: &str, value_pattern: &Regex, index: &LineIndex) -> Vec<FoundValue> {
    value_pattern
        .find_iter(text)
        .map(|m| {
            let char_index = text[..m.start()].chars().count();
            let length = text[m.start()..m.end()].chars().count();
            FoundValue {
                position: index.position_of(char_index, length),
                matched_text: m.as_str().to_string(),
            }
        })
        .collect()
}

/// Find every value match, correlate each with its best anchor (by bonus,
/// tie-broken by smaller distance), and emit one [`AnchoredMatch`] per
/// value.
pub fn find_anchored(
    text: &str,
    value_pattern: &Regex,
    anchors: &[Anchor],
    base_votes: i32,
) -> Vec<AnchoredMatch> {
    let index = LineIndex::new(text);
    let found_anchors = collect_anchor_matches(text, anchors, &index);
    let found_values = collect_value_matches(text, value_pattern, &index);

    let mut matches = Vec::new();
    for value in &found_values {
        let mut best: Option<(i32, usize, AnchorPosition, &FoundAnchor)> = None;

        for found_anchor in &found_anchors {
            let Some((position, distance)) = relate(&found_anchor.position, &value.position) else {
                continue;
            };
            let multiplier = bonus_for(position, distance);
            let bonus = (found_anchor.anchor.bonus_votes as f64 * multiplier).round() as i32;

            let is_better = match &best {
                None => true,
                Some((best_bonus, best_distance, _, _)) => {
                    bonus > *best_bonus || (bonus == *best_bonus && distance < *best_distance)
                }
            };
            if is_better {
                best = Some((bonus, distance, position, found_anchor));
            }
        }

        match best {
            Some((bonus, distance, position, found_anchor)) => {
                matches.push(AnchoredMatch {
                    value: value.matched_text.clone(),
                    base_votes,
                    anchor_bonus: bonus,
                    anchor_matched: Some(found_anchor.anchor.description.to_string()),
                    position,
                    distance,
                    matched_text: value.matched_text.clone(),
                    value_position: value.position,
                });
            }
            None => {
                matches.push(AnchoredMatch {
                    value: value.matched_text.clone(),
                    base_votes,
                    anchor_bonus: 0,
                    anchor_matched: None,
                    position: AnchorPosition::None,
                    distance: 0,
                    matched_text: value.matched_text.clone(),
                    value_position: value.position,
                });
            }
        }
    }

    matches
}

/// The match with the maximum `total_votes`; ties keep the earliest-found
/// (i.e. earliest char position) candidate, since `find_anchored` walks
/// `find_iter` in left-to-right order.
pub fn extract_best(matches: &[AnchoredMatch]) -> Option<&AnchoredMatch> {
    matches.iter().fold(None, |best, candidate| match best {
        None => Some(candidate),
        Some(current) if candidate.total_votes() > current.total_votes() => Some(candidate),
        Some(current) => Some(current),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(pattern: &str, bonus_votes: i32) -> Anchor {
        Anchor {
            pattern: Regex::new(pattern).unwrap(),
            bonus_votes,
            description: "test anchor",
        }
    }

    #[test]
    fn left_anchor_within_three_columns_gets_full_multiplier() {
        let text = "Total: 100.00";
        let anchors = vec![anchor(r"Total:", 10)];
        let value_pattern = Regex::new(r"\d+\.\d{2}").unwrap();
        let matches = find_anchored(text, &value_pattern, &anchors, 1);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].position, AnchorPosition::Left);
        assert_eq!(matches[0].anchor_bonus, 10);
    }

    #[test]
    fn value_with_no_nearby_anchor_gets_no_bonus() {
        let text = format!("Total: 1{}100.00", " ".repeat(200));
        let anchors = vec![anchor(r"Total:", 10)];
        let value_pattern = Regex::new(r"100\.00").unwrap();
        let matches = find_anchored(&text, &value_pattern, &anchors, 1);
        assert_eq!(matches[0].position, AnchorPosition::None);
        assert_eq!(matches[0].anchor_bonus, 0);
    }

    #[test]
    fn above_anchor_on_adjacent_line_gets_highest_above_multiplier() {
        let text = "Invoice Date\n2024-01-01";
        let anchors = vec![anchor(r"Invoice Date", 10)];
        let value_pattern = Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap();
        let matches = find_anchored(text, &value_pattern, &anchors, 1);
        assert_eq!(matches[0].position, AnchorPosition::Above);
        assert_eq!(matches[0].anchor_bonus, 9);
    }

    #[test]
    fn extract_best_picks_highest_total_votes() {
        let a = AnchoredMatch {
            value: "a".into(),
            base_votes: 1,
            anchor_bonus: 1,
            anchor_matched: None,
            position: AnchorPosition::None,
            distance: 0,
            matched_text: "a".into(),
            value_position: TextPosition { line: 0, column: 0, end_column: 1, char_index: 0 },
        };
        let b = AnchoredMatch { anchor_bonus: 5, ..a.clone() };
        let best = extract_best(&[a, b.clone()]).unwrap();
        assert_eq!(best.anchor_bonus, b.anchor_bonus);
    }
}
