//! Input line handling: continuation splicing, comments, variable
//! substitution, and word splitting.

use quark_core::{EngineError, EngineResult};
use smallvec::SmallVec;

/// Words of one command line.
pub type Words = SmallVec<[String; 8]>;

/// Join physical lines ending in `&` with the line that follows.
///
/// The `&` and the line break each become a space. Trailing whitespace
/// after the `&` is allowed. Text without markers is returned unchanged.
pub fn splice(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut lines = text.split('\n').peekable();
    while let Some(line) = lines.next() {
        let trimmed = line.trim_end();
        match trimmed.strip_suffix('&') {
            Some(head) if lines.peek().is_some() => {
                out.push_str(head);
                out.push_str("  ");
            }
            _ => {
                out.push_str(line);
                if lines.peek().is_some() {
                    out.push('\n');
                }
            }
        }
    }
    out
}

/// Remove a `#` comment that is not inside quotes.
pub fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (None, '#') => return &line[..i],
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
    }
    line
}

/// Replace `${name}` and `$x` references outside quotes using `lookup`.
///
/// `lookup` returns `None` for a name that cannot be substituted.
pub fn substitute<F>(line: &str, mut lookup: F) -> EngineResult<String>
where
    F: FnMut(&str) -> EngineResult<Option<String>>,
{
    if !line.contains('$') {
        return Ok(line.to_string());
    }
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut chars = line.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (None, '$') => {
                let name = match chars.next() {
                    Some((start, '{')) => {
                        let rest = &line[start + 1..];
                        let end = rest
                            .find('}')
                            .ok_or_else(|| EngineError::all("Invalid variable name in input line"))?;
                        for _ in 0..=rest[..end].chars().count() {
                            chars.next();
                        }
                        &rest[..end]
                    }
                    Some((start, c)) => &line[start..start + c.len_utf8()],
                    None => return Err(EngineError::all(format!("Invalid variable name in line: {}", &line[i..]))),
                };
                let value = lookup(name)?.ok_or_else(|| {
                    EngineError::all(format!("Substitution for illegal variable {name}"))
                })?;
                out.push_str(&value);
            }
            (None, '"' | '\'') => {
                quote = Some(c);
                out.push(c);
            }
            (Some(q), c) if c == q => {
                quote = None;
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// Split a line into words. Single- or double-quoted text forms one
/// word with the quotes removed.
pub fn split_words(line: &str) -> EngineResult<Words> {
    let mut words = Words::new();
    let mut chars = line.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            return Ok(words);
        };
        let mut word = String::new();
        if first == '"' || first == '\'' {
            chars.next();
            loop {
                match chars.next() {
                    Some(c) if c == first => break,
                    Some(c) => word.push(c),
                    None => return Err(EngineError::all("Unbalanced quotes in input line")),
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                word.push(c);
            }
        }
        words.push(word);
    }
}
