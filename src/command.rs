//! Line classification shared by the keyword-driven formats (OBJ, ASCII STL).

/// A format's set of line kinds.
pub trait Command: Copy + std::fmt::Debug {
    /// Recognises `line` and returns the command plus the text of its arguments.
    fn classify(line: &str) -> Option<(Self, &str)>;
}

/// A recognised line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified<'a, C> {
    pub command: C,
    pub args: &'a str,
    pub number: usize,
}

/// Splits a trimmed line into its leading keyword and the (trimmed) rest.
pub fn split_keyword(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(at) => (&line[..at], line[at..].trim_start()),
        None => (line, ""),
    }
}

/// Parses exactly `N` leading real numbers from `args`; extra trailing values are ignored.
///
/// On a short read returns how many numbers were parsed before the failure.
pub fn parse_reals<const N: usize>(args: &str) -> Result<[f64; N], usize> {
    let mut values = [0.0; N];
    let mut tokens = args.split_whitespace();
    for (i, slot) in values.iter_mut().enumerate() {
        *slot = tokens
            .next()
            .and_then(|t| t.parse::<f64>().ok())
            .ok_or(i)?;
    }
    Ok(values)
}
