//! Caret context extraction: which expression contains the caret, and what
//! query fragment is currently being typed.

use crate::scanner::{self, is_word_char, Expression};

/// The query fragment under the caret, ready for resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    /// The fragment being typed (e.g. `contact.na` or `step`)
    pub query: String,
    /// Char offset in the full text where the query starts; the query always
    /// ends at the caret
    pub start: usize,
    /// Whether function completions apply (the containing expression uses
    /// parentheses anywhere)
    pub include_functions: bool,
    /// Name of the enclosing function call, when the caret sits inside one's
    /// argument list
    pub function_context: Option<String>,
}

/// Select the expression containing `caret`, if any.
///
/// An expression contains the caret iff the caret is inside its span, or
/// sits at its end while the expression is still open. The caret at the
/// exact end of a *closed* expression is outside it.
pub fn locate(expressions: &[Expression], caret: usize) -> Option<&Expression> {
    expressions
        .iter()
        .find(|e| e.start <= caret && (caret < e.end || (caret == e.end && !e.closed)))
}

/// Derive the query fragment for the caret position within `expression`.
///
/// Walks backward from the caret, stopping at the first prefix char, `(`,
/// space, comma, `)`, or start of the expression. The stop character is
/// excluded from the fragment unless it is itself a word character, in which
/// case the walk keeps going past it.
pub fn extract_query(expression: &Expression, caret: usize, prefix: char) -> QueryContext {
    let offset = caret.saturating_sub(expression.start);
    let upto: Vec<char> = expression.text.chars().take(offset).collect();

    let mut start = upto.len();
    while start > 0 {
        let ch = upto[start - 1];
        if is_stop_char(ch, prefix) && !is_word_char(ch) {
            break;
        }
        start -= 1;
    }

    let query: String = upto[start..].iter().collect();
    let include_functions = expression.text.contains('(');
    let function_context = if include_functions {
        let preceding: String = upto[..start].iter().collect();
        scanner::function_context(&preceding)
    } else {
        None
    };

    QueryContext {
        query,
        start: expression.start + start,
        include_functions,
        function_context,
    }
}

fn is_stop_char(ch: char, prefix: char) -> bool {
    ch == prefix || matches!(ch, '(' | ' ' | ',' | ')')
}
