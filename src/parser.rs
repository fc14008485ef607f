use crate::ir::{DigitTree, ParsedText, Segments, TreeNode};
use crate::random::seed_from_digits;

/// Strips surrounding whitespace, byte order marks included.
pub fn trim_text(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Trims `text` and concatenates the decimal UTF-16 code of every unit: `"AB"` becomes `"6566"`.
pub fn encode(text: &str) -> String {
    let mut digits = String::new();
    for unit in trim_text(text).encode_utf16() {
        digits.push_str(&unit.to_string());
    }
    digits
}

/// Harvests flower tokens (`1` followed by zero or more `0`s) from the head of `digits`.
///
/// Scanning stops at the first digit that can neither extend nor open a token; that digit and
/// everything after it is the tree remainder.
pub fn segment(digits: &str) -> Segments {
    let bytes = digits.as_bytes();
    let mut flowers = Vec::new();
    let mut current: Option<String> = None;
    let mut stop = bytes.len();

    for (idx, byte) in bytes.iter().enumerate() {
        let digit = byte.wrapping_sub(b'0');
        if current.is_none() {
            if digit != 1 {
                stop = idx;
                break;
            }
            current = Some("1".to_string());
            continue;
        }
        if digit == 0 {
            if let Some(token) = current.as_mut() {
                token.push('0');
            }
            continue;
        }
        if let Some(token) = current.take() {
            flowers.push(token);
        }
        if digit == 1 {
            current = Some("1".to_string());
        } else {
            stop = idx;
            break;
        }
    }
    if let Some(token) = current {
        flowers.push(token);
    }

    Segments {
        flowers,
        remainder: digits[stop..].to_string(),
    }
}

/// Expands `digits` breadth first: each digit gives the next pending node that many children.
///
/// Nodes are numbered in the order they are created, so the pending queue is simply every node
/// after the last one expanded.
pub fn build_tree(digits: &str) -> DigitTree {
    let mut nodes = vec![TreeNode::default()];
    let mut next = 0;

    for ch in digits.chars() {
        if next >= nodes.len() {
            break;
        }
        let count = ch.to_digit(10).unwrap_or(0) as usize;
        if count > 0 {
            nodes[next].first_child = nodes.len();
            nodes[next].child_count = count;
            nodes.resize(nodes.len() + count, TreeNode::default());
        }
        next += 1;
    }

    DigitTree::from_breadth_first(nodes)
}

pub fn parse_text(text: &str) -> ParsedText {
    let trimmed = trim_text(text).to_string();
    let digits = encode(&trimmed);
    let seed = seed_from_digits(&digits);
    let segments = segment(&digits);
    let tree = build_tree(&segments.remainder);
    ParsedText {
        text: trimmed,
        digits,
        seed,
        segments,
        tree,
    }
}

/// Sum of the decimal digits of the encoded text; the "number" sort key of the grid layout.
pub fn digit_sum(text: &str) -> u64 {
    encode(text)
        .bytes()
        .map(|byte| u64::from(byte.wrapping_sub(b'0')))
        .sum()
}
