//! The completion engine: one keystroke in, ranked options out.
//!
//! [`Completer`] wires the pipeline together: text + caret go through the
//! scanner and context extractor, the query fans out to the schema resolver
//! and the function matcher, and a chosen option comes back through the
//! insertion planner. All of it is synchronous and pure; the only persistent
//! state is the immutable schema, catalog, and keyed assets loaded at
//! construction.

use crate::context::{self, QueryContext};
use crate::errors::{TempletError, TempletResult};
use crate::functions::{self, Function};
use crate::insertion::{self, Insertion};
use crate::resolver;
use crate::scanner::{is_word_char, Scanner};
use crate::schema::{KeyedAssets, Schema};

/// One candidate completion, property or function, used uniformly downstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOption {
    Property {
        /// Fully-qualified dotted name, e.g. `contact.name`
        name: String,
        summary: String,
    },
    Function {
        /// Canonical call form, e.g. `SUM(values)`
        signature: String,
        summary: String,
        detail: Option<String>,
        examples: Vec<String>,
    },
}

impl CompletionOption {
    pub fn property(name: impl Into<String>, summary: impl Into<String>) -> Self {
        CompletionOption::Property {
            name: name.into(),
            summary: summary.into(),
        }
    }

    /// Display label: the dotted name or the full signature
    pub fn label(&self) -> &str {
        match self {
            CompletionOption::Property { name, .. } => name,
            CompletionOption::Function { signature, .. } => signature,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            CompletionOption::Property { summary, .. } => summary,
            CompletionOption::Function { summary, .. } => summary,
        }
    }
}

impl From<&Function> for CompletionOption {
    fn from(function: &Function) -> Self {
        CompletionOption::Function {
            signature: function.signature.clone(),
            summary: function.summary.clone(),
            detail: function.detail.clone(),
            examples: function.examples.clone(),
        }
    }
}

/// Caller-supplied construction parameters
#[derive(Debug, Clone)]
pub struct CompleterConfig {
    /// Character introducing an expression
    pub prefix: char,
    /// Identifiers usable directly after the prefix without parentheses
    pub top_levels: Vec<String>,
    /// Resolve against the full session root instead of the reduced set
    pub session: bool,
}

impl Default for CompleterConfig {
    fn default() -> Self {
        Self {
            prefix: '@',
            top_levels: Vec::new(),
            session: false,
        }
    }
}

impl CompleterConfig {
    pub fn new(top_levels: Vec<String>) -> Self {
        Self {
            top_levels,
            ..Self::default()
        }
    }

    /// Fail fast on invalid construction parameters
    pub fn validate(&self) -> TempletResult<()> {
        for name in &self.top_levels {
            if name.is_empty() || !name.chars().all(is_word_char) {
                return Err(TempletError::invalid_top_level(name.clone()));
            }
        }
        Ok(())
    }
}

/// Suggestions for one caret position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestions {
    /// Ordered candidate list for the caller's listbox to render
    pub options: Vec<CompletionOption>,
    /// The query context the options were derived from; `None` when the
    /// caret is outside any expression
    pub context: Option<QueryContext>,
    /// The enclosing call's function while inside its argument list, for
    /// persistent signature display
    pub current_function: Option<Function>,
}

impl Suggestions {
    fn none() -> Self {
        Self {
            options: Vec::new(),
            context: None,
            current_function: None,
        }
    }
}

/// The completion engine
#[derive(Debug, Clone)]
pub struct Completer {
    config: CompleterConfig,
    scanner: Scanner,
    schema: Schema,
    functions: Vec<Function>,
    assets: KeyedAssets,
}

impl Completer {
    pub fn new(
        config: CompleterConfig,
        schema: Schema,
        functions: Vec<Function>,
        assets: KeyedAssets,
    ) -> TempletResult<Self> {
        config.validate()?;
        let scanner = Scanner::new(config.prefix, config.top_levels.clone())?;
        Ok(Self {
            config,
            scanner,
            schema,
            functions,
            assets,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Compute completion options for the caret position.
    ///
    /// Total over all inputs: a caret outside any expression, an unknown
    /// path, or an unloaded asset feed all come back as empty suggestions.
    pub fn suggest(&self, text: &str, caret: usize) -> Suggestions {
        let expressions = self.scanner.scan(text);
        let Some(expression) = context::locate(&expressions, caret) else {
            return Suggestions::none();
        };
        let ctx = context::extract_query(expression, caret, self.config.prefix);

        let roots = self.schema.root_properties(self.config.session);
        let mut options = resolver::resolve_from(&self.schema, roots, &ctx.query, &self.assets);
        if ctx.include_functions {
            options.extend(
                functions::match_signatures(&self.functions, &ctx.query)
                    .into_iter()
                    .map(CompletionOption::from),
            );
        }

        let current_function = ctx
            .function_context
            .as_deref()
            .and_then(|name| functions::find_function(&self.functions, name))
            .cloned();

        Suggestions {
            options,
            context: Some(ctx),
            current_function,
        }
    }

    /// Splice a chosen option back into the text.
    ///
    /// Recomputes the query span for the caret and plans the replacement.
    /// With no expression under the caret the text comes back unchanged.
    pub fn apply(&self, text: &str, caret: usize, option: &CompletionOption) -> Insertion {
        let expressions = self.scanner.scan(text);
        let Some(expression) = context::locate(&expressions, caret) else {
            return Insertion {
                new_text: text.to_string(),
                new_caret: caret,
            };
        };
        let ctx = context::extract_query(expression, caret, self.config.prefix);

        // A terminal path resolved with a trailing dot filters back to
        // itself, so "has descendants" means some option strictly below it.
        let has_descendants = match option {
            CompletionOption::Property { name, .. } => {
                let roots = self.schema.root_properties(self.config.session);
                resolver::resolve_from(&self.schema, roots, &format!("{}.", name), &self.assets)
                    .iter()
                    .any(|o| o.label() != name)
            }
            CompletionOption::Function { .. } => false,
        };

        insertion::plan(text, caret, &ctx.query, option, has_descendants)
    }
}
