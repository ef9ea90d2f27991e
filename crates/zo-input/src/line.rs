//! Separator handling for the logger's mixed CSV dialect.

/// The characters accepted as column separators, mixed freely per line.
pub const SEPARATORS: [char; 3] = [';', ',', '\t'];

/// Split a line on any separator character.  Tokens are trimmed; empty
/// tokens are preserved so callers can report them.
pub fn split_tokens(line: &str) -> Vec<&str> {
    line.split(SEPARATORS).map(str::trim).collect()
}

/// Whether `s` is a plausible id: non-empty, ASCII alphanumerics, spaces,
/// and `-` only.
pub fn is_valid_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
}

/// `HH:MM:SS` with the fraction lost to a decimal-comma split.
pub fn looks_like_time_head(s: &str) -> bool {
    s.contains(':') && !s.contains('.')
}

/// One or two digits — a fraction severed from its time token.
pub fn is_fraction(s: &str) -> bool {
    (1..=2).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// Split a fixed-arity row, repairing times that a `,` decimal separator
/// broke in two.
///
/// `time_cols` are the (ascending) expected positions of time-of-day
/// columns.  When the raw split yields more than `expected` tokens, each
/// time column whose token ends abruptly (`12:01:33` followed by `05`) is
/// rejoined with a `.`.  Returns `None` when the row still doesn't have
/// exactly `expected` tokens afterwards.
pub fn split_row(line: &str, expected: usize, time_cols: &[usize]) -> Option<Vec<String>> {
    let mut tokens: Vec<String> = split_tokens(line).into_iter().map(str::to_owned).collect();

    // Columns left of `col` are already single tokens once processed in
    // ascending order, so `col` is the actual index as well.
    for &col in time_cols {
        if tokens.len() <= expected {
            break;
        }
        if col + 1 < tokens.len()
            && looks_like_time_head(&tokens[col])
            && is_fraction(&tokens[col + 1])
        {
            let frac = tokens.remove(col + 1);
            tokens[col] = format!("{}.{}", tokens[col], frac);
        }
    }

    (tokens.len() == expected).then_some(tokens)
}
