//! Final assembly of detected blocks into one formatted text output.

/// A line is a label:value pair worth aligning if it contains a colon that
/// isn't part of a URL scheme (`http://`, `https://`, or any `//` right
/// after the colon).
fn is_label_line(line: &str) -> bool {
    if line.trim().is_empty() {
        return false;
    }
    let Some(colon_pos) = line.find(':') else {
        return false;
    };
    if line.starts_with("http://") || line.starts_with("https://") {
        return false;
    }
    let bytes: Vec<char> = line.chars().collect();
    if colon_pos >= 2 && bytes.get(colon_pos + 1) == Some(&'/') && bytes.get(colon_pos + 2) == Some(&'/')
    {
        return false;
    }
    true
}

/// Pad the label portion of consecutive label:value lines so every colon
/// lands at the same column.
fn align_key_value_groups(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut result: Vec<String> = Vec::new();
    let mut i = 0usize;

    while i < lines.len() {
        let mut group: Vec<&str> = Vec::new();
        while i < lines.len() && is_label_line(lines[i]) {
            group.push(lines[i]);
            i += 1;
        }

        if group.len() >= 2 {
            let max_label_width = group
                .iter()
                .map(|line| line.find(':').unwrap())
                .max()
                .unwrap_or(0);
            for line in &group {
                let colon_pos = line.find(':').unwrap();
                let label = &line[..colon_pos];
                let value = line[colon_pos + 1..].trim_start();
                let padding = " ".repeat(max_label_width - label.chars().count());
                result.push(format!("{label}{padding}: {value}"));
            }
        } else if let Some(single) = group.first() {
            result.push(single.to_string());
        } else {
            result.push(lines[i].to_string());
            i += 1;
        }
    }

    result.join("\n")
}

/// Collapse any run of 3+ consecutive newlines (two or more blank lines)
/// down to a single blank line.
fn collapse_blank_lines(text: &str) -> String {
    let mut text = text.to_string();
    while text.contains("\n\n\n") {
        text = text.replace("\n\n\n", "\n\n");
    }
    text
}

/// Remove a blank line sitting directly between two labeled lines.
fn collapse_between_labels(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut result: Vec<&str> = Vec::new();
    let mut i = 0usize;

    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty()
            && !result.is_empty()
            && i + 1 < lines.len()
            && result.last().unwrap().contains(':')
            && lines[i + 1].contains(':')
        {
            i += 1;
            continue;
        }
        result.push(line);
        i += 1;
    }

    result.join("\n")
}

/// Join blocks with a blank line, collapse excess blank runs, remove blank
/// lines wedged between two labeled lines, and align key:value groups.
pub fn format_output(blocks: &[String]) -> String {
    let output = blocks.join("\n\n");
    let output = collapse_blank_lines(&output);
    let output = collapse_between_labels(&output);
    align_key_value_groups(&output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_colons_at_the_same_column() {
        let formatted = format_output(&["A: 1".to_string(), "BB: 2".to_string(), "CCC: 3".to_string()]);
        for line in formatted.lines() {
            assert_eq!(line.find(':'), Some(3));
        }
    }

    #[test]
    fn collapses_triple_blank_runs() {
        let formatted = format_output(&["one".to_string(), "".to_string(), "two".to_string()]);
        assert!(!formatted.contains("\n\n\n"));
    }

    #[test]
    fn skips_url_colons_when_aligning() {
        let formatted = format_output(&["Website: https://example.com".to_string()]);
        assert_eq!(formatted, "Website: https://example.com");
    }

    #[test]
    fn collapses_blank_line_between_two_labeled_lines() {
        let joined = "Name: Acme\n\nTotal: 12".to_string();
        let result = collapse_between_labels(&joined);
        assert_eq!(result, "Name: Acme\nTotal: 12");
    }

    #[test]
    fn already_aligned_group_is_a_no_op() {
        let first = format_output(&["A  : 1".to_string(), "BB : 2".to_string()]);
        let second = format_output(&[first.clone()]);
        assert_eq!(first, second);
    }
}
