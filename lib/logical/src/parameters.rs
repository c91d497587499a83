//! Runtime parameter syntax.
//!
//! `??N` refers to the N-th runtime parameter and `??` to the parameter after the one referred to
//! by the previous `??`. Both are rewritten into reserved variables before the query is parsed.

use crate::PatternError;

const PARAMETER_PREFIX: &str = "__param";

/// The name of the variable that stands for the parameter with the given zero-based index.
pub fn parameter_variable(index: usize) -> String {
    format!("{PARAMETER_PREFIX}{index}")
}

/// Returns the zero-based parameter index if `name` is a parameter variable.
pub fn parameter_index(name: &str) -> Option<usize> {
    name.strip_prefix(PARAMETER_PREFIX)?.parse().ok()
}

/// The query text after parameter references have been rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterizedText {
    pub text: String,
    /// One more than the largest parameter index that is referenced.
    pub parameter_count: usize,
}

/// Rewrites all parameter references of `text`.
///
/// String literals, iris, and comments are copied unchanged.
pub fn rewrite_parameters(text: &str) -> Result<ParameterizedText, PatternError> {
    let chars = text.char_indices().collect::<Vec<_>>();
    let mut output = String::with_capacity(text.len());
    let mut parameter_count = 0;
    let mut next_positional = 0;
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            '"' | '\'' => {
                let end = string_end(text, offset, c);
                output.push_str(&text[offset..end]);
                i = skip_to(&chars, end);
            }
            '<' => {
                let end = iri_end(text, offset).unwrap_or(offset + 1);
                output.push_str(&text[offset..end]);
                i = skip_to(&chars, end);
            }
            '#' => {
                let end = text[offset..]
                    .find('\n')
                    .map_or(text.len(), |position| offset + position);
                output.push_str(&text[offset..end]);
                i = skip_to(&chars, end);
            }
            '?' if text[offset..].starts_with("??") => {
                let digits_start = offset + 2;
                let digits = text[digits_start..]
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .count();
                let index = if digits == 0 {
                    next_positional += 1;
                    next_positional - 1
                } else {
                    let number = &text[digits_start..digits_start + digits];
                    match number.parse::<usize>() {
                        Ok(number) if number > 0 => number - 1,
                        _ => return Err(PatternError::InvalidParameter(number.to_owned())),
                    }
                };
                parameter_count = parameter_count.max(index + 1);
                output.push('?');
                output.push_str(&parameter_variable(index));
                i = skip_to(&chars, digits_start + digits);
            }
            _ => {
                output.push(c);
                i += 1;
            }
        }
    }

    Ok(ParameterizedText {
        text: output,
        parameter_count,
    })
}

fn skip_to(chars: &[(usize, char)], offset: usize) -> usize {
    chars.partition_point(|(position, _)| *position < offset)
}

/// Returns the offset after the string literal that starts at `start`.
fn string_end(text: &str, start: usize, quote: char) -> usize {
    let long_quote = if quote == '"' { "\"\"\"" } else { "'''" };
    if text[start..].starts_with(long_quote) {
        let body = start + 3;
        return text[body..]
            .find(long_quote)
            .map_or(text.len(), |position| body + position + 3);
    }

    let mut escaped = false;
    for (position, c) in text[start + 1..].char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '\n' => return start + 1 + position,
            _ if c == quote => return start + 1 + position + 1,
            _ => {}
        }
    }
    text.len()
}

/// Returns the offset after the iri that starts at `start`, or [None] if the `<` is an operator.
fn iri_end(text: &str, start: usize) -> Option<usize> {
    for (position, c) in text[start + 1..].char_indices() {
        match c {
            '>' => return Some(start + 1 + position + 1),
            '<' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => return None,
            _ if c.is_whitespace() => return None,
            _ => {}
        }
    }
    None
}
