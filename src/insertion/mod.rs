//! Insertion planning: splice a chosen completion back into the text.
//!
//! Pure text surgery over char offsets; the caller applies the resulting
//! `(new_text, new_caret)` pair to its input field.

use crate::completion::CompletionOption;

/// Replacement text and caret after a completion is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub new_text: String,
    pub new_caret: usize,
}

/// Plan the splice for `option` at the caret.
///
/// Removes exactly the query's length in chars ending at the caret and
/// inserts the option's dotted name or function name. The trailing
/// separator follows one of three mutually exclusive policies:
///
/// 1. a path with further descendant completions gets a `.`,
/// 2. a function gets `()` with the caret parked inside (or bare `NAME`
///    when an open paren already follows the caret),
/// 3. anything else gets a single space to terminate the expression.
pub fn plan(
    text: &str,
    caret: usize,
    query: &str,
    option: &CompletionOption,
    has_descendants: bool,
) -> Insertion {
    let chars: Vec<char> = text.chars().collect();
    let caret = caret.min(chars.len());
    let start = caret.saturating_sub(query.chars().count());

    let head: String = chars[..start].iter().collect();
    let tail: String = chars[caret..].iter().collect();

    let (inserted, caret_within) = match option {
        CompletionOption::Property { name, .. } => {
            if has_descendants {
                let inserted = format!("{}.", name);
                let len = inserted.chars().count();
                (inserted, len)
            } else {
                let inserted = format!("{} ", name);
                let len = inserted.chars().count();
                (inserted, len)
            }
        }
        CompletionOption::Function { signature, .. } => {
            let name = signature.split('(').next().unwrap_or(signature);
            if tail.starts_with('(') {
                // Arguments already follow; the existing paren stays in charge.
                (name.to_string(), name.chars().count())
            } else {
                (format!("{}()", name), name.chars().count() + 1)
            }
        }
    };

    let new_caret = start + caret_within;
    Insertion {
        new_text: format!("{}{}{}", head, inserted, tail),
        new_caret,
    }
}
