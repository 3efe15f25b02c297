//! Expression locator for embedded template expressions.
//!
//! Scans free-form text for expression spans such as `@contact.name` or
//! `@(SUM(contact.age, step.value))` without parsing the surrounding text.
//! The scan is a closed state machine ([`ScanState`]) driven by a single
//! transition function, recomputed from scratch on every call: there is no
//! incremental state carried between keystrokes.

use crate::errors::{TempletError, TempletResult};

/// A located expression span.
///
/// `start`/`end` are half-open char offsets into the scanned text. `text`
/// includes the prefix character. `closed` is true only for a parenthesized
/// expression whose nesting returned to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub closed: bool,
}

/// States of the expression scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Plain text between expressions
    Body,
    /// Just consumed the prefix character of a candidate expression
    Prefix,
    /// Inside a dotted-path expression (`@contact.name`)
    Identifier,
    /// Inside a parenthesized expression, tracking nesting depth
    Balanced,
    /// Inside a double-quoted string within a parenthesized expression
    StringLiteral,
    /// Just consumed the first character of an escape pair (`@@`)
    EscapedPrefix,
}

/// Word characters may appear in identifiers and dotted paths
pub(crate) fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Finds expression spans inside arbitrary text.
///
/// Holds the caller-supplied prefix character and the allowed top-level
/// identifier set. Construction rejects prefix characters the state machine
/// could not disambiguate (word chars, whitespace, structural chars).
#[derive(Debug, Clone)]
pub struct Scanner {
    prefix: char,
    top_levels: Vec<String>,
}

impl Scanner {
    pub fn new(prefix: char, top_levels: Vec<String>) -> TempletResult<Self> {
        if is_word_char(prefix) || prefix.is_whitespace() || "()\".,".contains(prefix) {
            return Err(TempletError::invalid_prefix(
                prefix,
                "the prefix must not be a word character, whitespace, or one of ( ) \" . ,",
            ));
        }
        Ok(Self { prefix, top_levels })
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    /// Find all expression spans in `text`.
    ///
    /// Returned spans are ordered and non-overlapping. Malformed input never
    /// fails: unterminated expressions stay open until end-of-input and
    /// candidates rejected by the validity gate are dropped silently.
    pub fn scan(&self, text: &str) -> Vec<Expression> {
        let chars: Vec<char> = text.chars().collect();
        let mut machine = Machine::new(self, &chars);
        let mut expressions = Vec::new();

        let mut i = 0;
        while i < chars.len() {
            let lookahead = chars.get(i + 1).copied();
            let step = machine.step(i, chars[i], lookahead);
            if let Some(expression) = step.emitted {
                expressions.push(expression);
            }
            if !step.reprocess {
                i += 1;
            }
        }

        if let Some(expression) = machine.finish() {
            expressions.push(expression);
        }

        expressions
    }

    /// Validity gate for identifier-style candidates.
    ///
    /// The first path segment must exactly equal an allowed top-level name.
    /// A candidate that reaches end-of-input (still being typed) also passes
    /// if the segment is a case-insensitive prefix of an allowed name.
    fn is_valid_start(&self, body: &str, at_end_of_input: bool) -> bool {
        let first = body.split('.').next().unwrap_or(body);
        if self.top_levels.iter().any(|name| name == first) {
            return true;
        }
        if !at_end_of_input {
            return false;
        }
        let first = first.to_lowercase();
        self.top_levels
            .iter()
            .any(|name| name.to_lowercase().starts_with(&first))
    }
}

/// One transition of the scan machine
struct Step {
    emitted: Option<Expression>,
    /// The same index must be fed again in the new state
    reprocess: bool,
}

impl Step {
    fn next() -> Self {
        Step {
            emitted: None,
            reprocess: false,
        }
    }

    fn emit(expression: Option<Expression>, reprocess: bool) -> Self {
        Step {
            emitted: expression,
            reprocess,
        }
    }
}

/// Scan machine: current state plus the in-progress candidate
struct Machine<'a> {
    scanner: &'a Scanner,
    chars: &'a [char],
    state: ScanState,
    /// Start offset of the in-progress candidate (index of its prefix char)
    start: usize,
    /// Paren nesting depth while in Balanced/StringLiteral
    depth: usize,
}

impl<'a> Machine<'a> {
    fn new(scanner: &'a Scanner, chars: &'a [char]) -> Self {
        Self {
            scanner,
            chars,
            state: ScanState::Body,
            start: 0,
            depth: 0,
        }
    }

    /// The single transition function: `(state, char, lookahead)` decides the
    /// next state and the expression emitted by this transition, if any.
    fn step(&mut self, i: usize, ch: char, lookahead: Option<char>) -> Step {
        let prefix = self.scanner.prefix;
        match self.state {
            ScanState::Body => {
                if ch == prefix {
                    if lookahead == Some(prefix) {
                        // Escape pair: consume both prefix chars, no expression.
                        self.state = ScanState::EscapedPrefix;
                    } else if lookahead.map(is_word_char) == Some(true) {
                        self.state = ScanState::Prefix;
                        self.start = i;
                    } else if lookahead == Some('(') {
                        self.state = ScanState::Prefix;
                        self.start = i;
                    }
                }
                Step::next()
            }

            ScanState::EscapedPrefix => {
                // Second half of the escape pair; the char after it is plain body.
                self.state = ScanState::Body;
                Step::next()
            }

            ScanState::Prefix => {
                if ch == '(' {
                    self.state = ScanState::Balanced;
                    self.depth = 1;
                } else {
                    self.state = ScanState::Identifier;
                }
                Step::next()
            }

            ScanState::Identifier => {
                if is_word_char(ch) {
                    return Step::next();
                }
                if ch == '.' && lookahead.map(is_word_char) == Some(true) {
                    return Step::next();
                }
                if ch == '.' && lookahead.is_none() {
                    // A trailing dot at end-of-input stays with the candidate:
                    // the user is mid-keystroke and the dot is what selects
                    // the next path level. A dot followed by anything else
                    // never joins the expression.
                    return Step::next();
                }
                // Terminated by `ch`; the terminator may start the next
                // expression, so it is re-examined in Body.
                let expression = self.take_identifier(i, false);
                self.state = ScanState::Body;
                Step::emit(expression, true)
            }

            ScanState::Balanced => {
                match ch {
                    '"' => self.state = ScanState::StringLiteral,
                    '(' => self.depth += 1,
                    ')' => {
                        self.depth -= 1;
                        if self.depth == 0 {
                            let expression = self.take_balanced(i + 1, true);
                            self.state = ScanState::Body;
                            return Step::emit(Some(expression), false);
                        }
                    }
                    _ => {}
                }
                Step::next()
            }

            ScanState::StringLiteral => {
                // Verbatim until the matching quote; parens inside do not count.
                if ch == '"' {
                    self.state = ScanState::Balanced;
                }
                Step::next()
            }
        }
    }

    /// Finalize whatever candidate is still open at end-of-input
    fn finish(&mut self) -> Option<Expression> {
        match self.state {
            ScanState::Identifier => self.take_identifier(self.chars.len(), true),
            ScanState::Balanced | ScanState::StringLiteral => {
                Some(self.take_balanced(self.chars.len(), false))
            }
            ScanState::Body | ScanState::Prefix | ScanState::EscapedPrefix => None,
        }
    }

    fn take_identifier(&self, end: usize, at_end_of_input: bool) -> Option<Expression> {
        let body: String = self.chars[self.start + 1..end].iter().collect();
        if !self.scanner.is_valid_start(&body, at_end_of_input) {
            return None;
        }
        Some(Expression {
            start: self.start,
            end,
            text: self.chars[self.start..end].iter().collect(),
            closed: false,
        })
    }

    fn take_balanced(&self, end: usize, closed: bool) -> Expression {
        Expression {
            start: self.start,
            end,
            text: self.chars[self.start..end].iter().collect(),
            closed,
        }
    }
}

/// Identify the enclosing function call of a partial expression.
///
/// Scans `partial` backward tracking paren depth and double-quote state and
/// returns the identifier immediately preceding the innermost unmatched `(`.
/// Used to show which function's arguments the caret is inside.
pub fn function_context(partial: &str) -> Option<String> {
    let chars: Vec<char> = partial.chars().collect();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut i = chars.len();

    while i > 0 {
        i -= 1;
        let ch = chars[i];
        if in_string {
            if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            ')' => depth += 1,
            '(' => {
                if depth > 0 {
                    depth -= 1;
                    continue;
                }
                // Innermost unmatched open paren: the word before it names
                // the call. A bare grouping paren has no callee; keep
                // scanning outward.
                let mut s = i;
                while s > 0 && is_word_char(chars[s - 1]) {
                    s -= 1;
                }
                if s < i {
                    return Some(chars[s..i].iter().collect());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scanner() -> Scanner {
        Scanner::new(
            '@',
            vec![
                "contact".to_string(),
                "channel".to_string(),
                "step".to_string(),
                "date".to_string(),
            ],
        )
        .unwrap()
    }

    fn scan(text: &str) -> Vec<Expression> {
        scanner().scan(text)
    }

    fn texts(expressions: &[Expression]) -> Vec<&str> {
        expressions.iter().map(|e| e.text.as_str()).collect()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(scan(""), vec![]);
        assert_eq!(scan("hello world"), vec![]);
        assert_eq!(scan("no expressions here."), vec![]);
    }

    #[test]
    fn test_identifier_expression() {
        let found = scan("Hi @contact how are you?");
        assert_eq!(
            found,
            vec![Expression {
                start: 3,
                end: 11,
                text: "@contact".to_string(),
                closed: false,
            }]
        );
    }

    #[test]
    fn test_bare_prefix_is_not_an_expression() {
        assert_eq!(scan("mail me @ home"), vec![]);
        assert_eq!(scan("trailing @"), vec![]);
    }

    #[test]
    fn test_double_prefix_escapes() {
        assert_eq!(scan("Email us @@contact today"), vec![]);
        assert_eq!(scan("hi @@contact"), vec![]);
    }

    #[test]
    fn test_triple_prefix_starts_at_last() {
        let found = scan("hi @@@contact");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "@contact");
        assert_eq!(found[0].start, 5);
    }

    #[test]
    fn test_quadruple_prefix_suppresses() {
        assert_eq!(scan("hi @@@@contact"), vec![]);
    }

    #[test]
    fn test_greedy_dotted_path() {
        let found = scan("born @contact.born.where.location ok");
        assert_eq!(texts(&found), vec!["@contact.born.where.location"]);
    }

    #[test]
    fn test_trailing_space_ends_expression() {
        let found = scan("hello @contact ");
        assert_eq!(
            found,
            vec![Expression {
                start: 6,
                end: 14,
                text: "@contact".to_string(),
                closed: false,
            }]
        );
    }

    #[test]
    fn test_dot_before_non_word_is_excluded() {
        let found = scan("Hi @contact. How are you?");
        assert_eq!(texts(&found), vec!["@contact"]);
        assert_eq!(found[0].end, 11);
    }

    #[test]
    fn test_trailing_dot_at_end_of_input_is_kept() {
        // Mid-keystroke: the user just typed the separator for the next level.
        let found = scan("Hi @contact.");
        assert_eq!(texts(&found), vec!["@contact."]);
        assert_eq!(found[0].end, 12);
    }

    #[test]
    fn test_balanced_open() {
        let found = scan("total @(SUM(contact.age, step.value)");
        assert_eq!(
            found,
            vec![Expression {
                start: 6,
                end: 36,
                text: "@(SUM(contact.age, step.value)".to_string(),
                closed: false,
            }]
        );
    }

    #[test]
    fn test_balanced_closed() {
        let found = scan("total @(SUM(contact.age, step.value))");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "@(SUM(contact.age, step.value))");
        assert!(found[0].closed);
    }

    #[test]
    fn test_text_after_closed_expression_is_body() {
        let found = scan("@(MAX(1, 2)) and @(MIN(3, 4))");
        assert_eq!(texts(&found), vec!["@(MAX(1, 2))", "@(MIN(3, 4))"]);
        assert!(found.iter().all(|e| e.closed));
    }

    #[test]
    fn test_string_literal_hides_parens() {
        let found = scan("say @(TITLE(\"a)b\"))");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "@(TITLE(\"a)b\"))");
        assert!(found[0].closed);
    }

    #[test]
    fn test_unterminated_string_stays_open() {
        let found = scan("say @(TITLE(\"abc");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "@(TITLE(\"abc");
        assert!(!found[0].closed);
    }

    #[test]
    fn test_gate_rejects_unknown_top_level_mid_text() {
        assert_eq!(scan("write to @example.com for info"), vec![]);
    }

    #[test]
    fn test_gate_accepts_prefix_only_at_end_of_input() {
        let found = scan("Hi @con");
        assert_eq!(texts(&found), vec!["@con"]);
        assert_eq!(scan("Hi @con and bye"), vec![]);
    }

    #[test]
    fn test_gate_prefix_is_case_insensitive() {
        let found = scan("Hi @CON");
        assert_eq!(texts(&found), vec!["@CON"]);
        assert_eq!(scan("Hi @xyz"), vec![]);
    }

    #[test]
    fn test_paren_style_always_accepted() {
        let found = scan("calc @(whatever");
        assert_eq!(texts(&found), vec!["@(whatever"]);
    }

    #[test]
    fn test_adjacent_expressions() {
        let found = scan("@contact.name@step.value ok");
        assert_eq!(texts(&found), vec!["@contact.name", "@step.value"]);
    }

    #[test]
    fn test_spans_ordered_and_non_overlapping() {
        let found = scan("a @contact b @(SUM(1, 2)) c @step.value");
        for pair in found.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_scan_is_deterministic() {
        let text = "Hi @contact.name, total @(SUM(step.value, 2)) @@escaped";
        assert_eq!(scan(text), scan(text));
    }

    #[test]
    fn test_rejects_word_char_prefix() {
        assert!(Scanner::new('a', vec![]).is_err());
        assert!(Scanner::new('(', vec![]).is_err());
        assert!(Scanner::new(' ', vec![]).is_err());
        assert!(Scanner::new('#', vec![]).is_ok());
    }

    // Per-transition checks against the machine itself.

    fn machine<'a>(scanner: &'a Scanner, chars: &'a [char]) -> Machine<'a> {
        Machine::new(scanner, chars)
    }

    #[test]
    fn test_transition_body_to_prefix() {
        let s = scanner();
        let chars: Vec<char> = "@c".chars().collect();
        let mut m = machine(&s, &chars);
        m.step(0, '@', Some('c'));
        assert_eq!(m.state, ScanState::Prefix);
        assert_eq!(m.start, 0);
    }

    #[test]
    fn test_transition_body_to_escaped_prefix() {
        let s = scanner();
        let chars: Vec<char> = "@@c".chars().collect();
        let mut m = machine(&s, &chars);
        m.step(0, '@', Some('@'));
        assert_eq!(m.state, ScanState::EscapedPrefix);
        m.step(1, '@', Some('c'));
        assert_eq!(m.state, ScanState::Body);
    }

    #[test]
    fn test_transition_prefix_to_balanced_sets_depth() {
        let s = scanner();
        let chars: Vec<char> = "@(".chars().collect();
        let mut m = machine(&s, &chars);
        m.step(0, '@', Some('('));
        m.step(1, '(', None);
        assert_eq!(m.state, ScanState::Balanced);
        assert_eq!(m.depth, 1);
    }

    #[test]
    fn test_transition_identifier_terminator_reprocesses() {
        let s = scanner();
        let chars: Vec<char> = "@contact!".chars().collect();
        let mut m = machine(&s, &chars);
        m.step(0, '@', Some('c'));
        for i in 1..8 {
            m.step(i, chars[i], chars.get(i + 1).copied());
        }
        let step = m.step(8, '!', None);
        assert_eq!(m.state, ScanState::Body);
        assert!(step.reprocess);
        assert_eq!(step.emitted.map(|e| e.text), Some("@contact".to_string()));
    }

    #[test]
    fn test_transition_balanced_close_emits() {
        let s = scanner();
        let chars: Vec<char> = "@()".chars().collect();
        let mut m = machine(&s, &chars);
        m.step(0, '@', Some('('));
        m.step(1, '(', Some(')'));
        let step = m.step(2, ')', None);
        assert_eq!(m.state, ScanState::Body);
        let emitted = step.emitted.unwrap();
        assert!(emitted.closed);
        assert_eq!(emitted.text, "@()");
    }

    #[test]
    fn test_transition_string_literal_round_trip() {
        let s = scanner();
        let chars: Vec<char> = "@(\")\"".chars().collect();
        let mut m = machine(&s, &chars);
        m.step(0, '@', Some('('));
        m.step(1, '(', Some('"'));
        m.step(2, '"', Some(')'));
        assert_eq!(m.state, ScanState::StringLiteral);
        m.step(3, ')', Some('"'));
        assert_eq!(m.state, ScanState::StringLiteral);
        m.step(4, '"', None);
        assert_eq!(m.state, ScanState::Balanced);
        assert_eq!(m.depth, 1);
    }

    // Backward function-context scan.

    #[test]
    fn test_function_context_simple_call() {
        assert_eq!(
            function_context("@(SUM(contact.age, "),
            Some("SUM".to_string())
        );
    }

    #[test]
    fn test_function_context_innermost_call() {
        assert_eq!(
            function_context("@(SUM(MAX(step.value, "),
            Some("MAX".to_string())
        );
    }

    #[test]
    fn test_function_context_closed_call_is_skipped() {
        assert_eq!(
            function_context("@(SUM(MAX(1, 2), "),
            Some("SUM".to_string())
        );
    }

    #[test]
    fn test_function_context_ignores_parens_in_strings() {
        assert_eq!(
            function_context("@(TITLE(\"with ( inside\", "),
            Some("TITLE".to_string())
        );
    }

    #[test]
    fn test_function_context_grouping_paren_has_no_callee() {
        assert_eq!(function_context("@("), None);
        assert_eq!(function_context("@contact.name"), None);
    }
}
