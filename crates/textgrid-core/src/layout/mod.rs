//! XY-cut recursive text-block segmentation: turn a monospaced text dump
//! into an ordered list of normalized, label-aligned blocks.

mod formatter;

pub use formatter::format_output;

/// A rectangular character matrix, rows padded to equal width.
struct TextMatrix {
    rows: Vec<Vec<char>>,
    width: usize,
}

impl TextMatrix {
    fn from_text(text: &str) -> Self {
        let lines: Vec<&str> = text.split('\n').collect();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let rows = lines
            .iter()
            .map(|line| {
                let mut chars: Vec<char> = line.chars().collect();
                chars.resize(width, ' ');
                chars
            })
            .collect();
        Self { rows, width }
    }

    fn is_blank_row(&self, row: usize) -> bool {
        self.rows[row].iter().all(|c| c.is_whitespace())
    }

    fn is_blank_col(&self, col: usize, start_row: usize, end_row: usize) -> bool {
        (start_row..=end_row).all(|r| self.rows[r][col].is_whitespace())
    }
}

/// Maximal contiguous runs of non-blank rows, each an inclusive `(start,
/// end)` row range.
fn split_horizontal(matrix: &TextMatrix) -> Vec<(usize, usize)> {
    let mut sections = Vec::new();
    let mut in_section = false;
    let mut section_start = 0usize;

    for r in 0..matrix.rows.len() {
        if matrix.is_blank_row(r) {
            if in_section {
                sections.push((section_start, r - 1));
                in_section = false;
            }
        } else if !in_section {
            section_start = r;
            in_section = true;
        }
    }
    if in_section {
        sections.push((section_start, matrix.rows.len() - 1));
    }
    sections
}

/// Maximal runs of blank columns of width `>= min_gap` within a row range.
fn find_vertical_gaps(
    matrix: &TextMatrix,
    start_row: usize,
    end_row: usize,
    min_gap: usize,
) -> Vec<(usize, usize)> {
    if matrix.width == 0 {
        return Vec::new();
    }
    let mut gaps = Vec::new();
    let mut in_gap = false;
    let mut gap_start = 0usize;

    for c in 0..matrix.width {
        if matrix.is_blank_col(c, start_row, end_row) {
            if !in_gap {
                gap_start = c;
                in_gap = true;
            }
        } else if in_gap {
            if c - gap_start >= min_gap {
                gaps.push((gap_start, c - 1));
            }
            in_gap = false;
        }
    }
    gaps
}

/// Tighten a candidate column range to the actual `(min_col, max_col)` of
/// non-blank characters present, or `None` if the range is entirely blank.
fn find_text_bounds(
    matrix: &TextMatrix,
    start_row: usize,
    end_row: usize,
    start_col: usize,
    end_col: usize,
) -> Option<(usize, usize)> {
    let mut min_c = end_col;
    let mut max_c: Option<usize> = None;
    for r in start_row..=end_row {
        for c in start_col..end_col.min(matrix.width) {
            if !matrix.rows[r][c].is_whitespace() {
                min_c = min_c.min(c);
                max_c = Some(max_c.map_or(c, |m| m.max(c)));
            }
        }
    }
    max_c.map(|max_c| (min_c, max_c))
}

/// Split a horizontal section into tightened vertical column ranges.
fn split_vertical(
    matrix: &TextMatrix,
    start_row: usize,
    end_row: usize,
    min_gap: usize,
) -> Vec<(usize, usize)> {
    if matrix.width == 0 {
        return Vec::new();
    }
    let gaps = find_vertical_gaps(matrix, start_row, end_row, min_gap);

    if gaps.is_empty() {
        return find_text_bounds(matrix, start_row, end_row, 0, matrix.width)
            .into_iter()
            .collect();
    }

    let mut columns = Vec::new();
    let mut prev_end = 0usize;
    for (gap_start, gap_end) in gaps {
        if let Some(bounds) = find_text_bounds(matrix, start_row, end_row, prev_end, gap_start) {
            columns.push(bounds);
        }
        prev_end = gap_end + 1;
    }
    if prev_end < matrix.width {
        if let Some(bounds) = find_text_bounds(matrix, start_row, end_row, prev_end, matrix.width)
        {
            columns.push(bounds);
        }
    }
    columns
}

const END_PUNCTUATION: [char; 5] = ['.', '!', '?', ':', ';'];
const JOIN_SEPARATORS: [char; 5] = [':', ')', ']', '}', ','];

/// Collapse label continuations, pull trailing numbers onto labeled lines,
/// and unwrap soft-wrapped prose within one block's extracted lines.
fn normalize_block(mut lines: Vec<String>) -> String {
    let non_empty: Vec<&String> = lines.iter().filter(|l| !l.is_empty()).collect();
    if non_empty.len() == 2 {
        let first = non_empty[0];
        let starts_with_digit = first.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false);
        if !first.ends_with(':') && !first.contains(':') && !starts_with_digit {
            let second = non_empty[1].clone();
            lines = vec![format!("{first}:"), second];
        }
    }

    let mut joined: Vec<String> = Vec::new();
    let mut i = 0usize;
    while i < lines.len() {
        let line = &lines[i];
        if line.ends_with(':') && i + 1 < lines.len() && !lines[i + 1].is_empty() {
            joined.push(format!("{} {}", line, lines[i + 1]));
            i += 2;
        } else {
            joined.push(line.clone());
            i += 1;
        }
    }

    let mut pulled_up: Vec<String> = Vec::new();
    for line in joined {
        let starts_with_number = line
            .chars()
            .next()
            .map(|c| c.is_ascii_digit() || c == '-')
            .unwrap_or(false);
        let prev_ends_with_separator = pulled_up
            .last()
            .map(|prev: &String| {
                !prev.is_empty() && prev.trim_end().ends_with(JOIN_SEPARATORS.as_slice())
            })
            .unwrap_or(false);
        if !line.is_empty() && starts_with_number && prev_ends_with_separator {
            let last = pulled_up.last_mut().unwrap();
            *last = format!("{last} {line}");
        } else {
            pulled_up.push(line);
        }
    }

    let mut unwrapped: Vec<String> = Vec::new();
    for line in pulled_up {
        let continuation_start = line
            .chars()
            .next()
            .map(|c| c.is_lowercase() || c.is_ascii_digit())
            .unwrap_or(false);
        let prev_is_open = unwrapped
            .last()
            .map(|prev: &String| !prev.is_empty() && !prev.trim_end().ends_with(END_PUNCTUATION.as_slice()))
            .unwrap_or(false);
        if !line.is_empty() && prev_is_open && continuation_start {
            let last = unwrapped.last_mut().unwrap();
            *last = format!("{last} {line}");
        } else {
            unwrapped.push(line);
        }
    }

    unwrapped.join("\n")
}

/// Slice, right-trim, and normalize one rectangular block.
fn extract_block(
    matrix: &TextMatrix,
    start_row: usize,
    end_row: usize,
    start_col: usize,
    end_col: usize,
) -> String {
    let mut lines: Vec<String> = (start_row..=end_row)
        .map(|r| {
            let slice: String = matrix.rows[r][start_col..=end_col.min(matrix.width.saturating_sub(1))]
                .iter()
                .collect();
            slice.trim_end().to_string()
        })
        .collect();

    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    normalize_block(lines)
}

/// Detect text blocks in a character matrix using the XY-cut algorithm.
fn detect_blocks(matrix: &TextMatrix, min_gap: usize) -> Vec<String> {
    let mut blocks = Vec::new();
    for (start_row, end_row) in split_horizontal(matrix) {
        for (start_col, end_col) in split_vertical(matrix, start_row, end_row, min_gap) {
            let content = extract_block(matrix, start_row, end_row, start_col, end_col);
            if !content.trim().is_empty() {
                blocks.push(content);
            }
        }
    }
    blocks
}

/// Process a document's raw text into its extracted, normalized blocks.
/// Never fails; an empty input yields an empty block list.
pub fn process_document(text: &str, min_gap: usize) -> Vec<String> {
    let matrix = TextMatrix::from_text(text);
    detect_blocks(&matrix, min_gap)
}

/// Run the full layout pipeline and produce the final formatted text.
pub fn extract(text: &str, min_gap: usize) -> String {
    let blocks = process_document(text, min_gap);
    format_output(&blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_block_with_no_gaps() {
        let blocks = process_document("hello world", 2);
        assert_eq!(blocks, vec!["hello world".to_string()]);
    }

    #[test]
    fn splits_two_column_layout() {
        let blocks = process_document("Invoice date 2024-01-01    Due date 2024-02-01", 2);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("Invoice date"));
        assert!(blocks[1].contains("Due date"));
    }

    #[test]
    fn min_gap_one_vs_two_differ_on_single_space_columns() {
        let text = "A B";
        let with_gap_1 = process_document(text, 1);
        let with_gap_2 = process_document(text, 2);
        assert_eq!(with_gap_1.len(), 2);
        assert_eq!(with_gap_2.len(), 1);
    }

    #[test]
    fn empty_input_yields_no_blocks() {
        assert!(process_document("", 2).is_empty());
    }

    #[test]
    fn normalizes_bare_label_pair() {
        let blocks = process_document("Description\nSome value", 2);
        assert_eq!(blocks, vec!["Description: Some value".to_string()]);
    }

    #[test]
    fn pulls_trailing_number_onto_labeled_line() {
        let blocks = process_document("Amount:\n1200", 2);
        assert_eq!(blocks, vec!["Amount: 1200".to_string()]);
    }
}
