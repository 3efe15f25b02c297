// Rust 1.93+ triggers false positives on thiserror/miette derive macro fields
#![allow(unused_assignments)]

//! Templet: context-aware autocomplete for embedded template expressions.
//!
//! Finds expression spans like `@contact.name` or `@(SUM(contact.age,
//! step.value))` inside free-form text and turns a caret position into a
//! ranked list of completion candidates, resolved against an immutable
//! schema and function catalog supplied by the caller.
//!
//! # Example
//!
//! ```
//! use templet::{Completer, CompleterConfig, KeyedAssets, Schema};
//!
//! let schema = Schema::from_json(r#"{
//!     "types": [{"name": "contact", "properties": [
//!         {"key": "name", "help": "Full name", "type": "text"}
//!     ]}],
//!     "root": [{"key": "contact", "help": "The contact", "type": "contact"}],
//!     "root_no_session": [{"key": "contact", "help": "The contact", "type": "contact"}]
//! }"#).unwrap();
//!
//! let config = CompleterConfig::new(vec!["contact".to_string()]);
//! let completer = Completer::new(config, schema, vec![], KeyedAssets::new()).unwrap();
//!
//! let suggestions = completer.suggest("Hello @contact.", 15);
//! assert_eq!(suggestions.options[0].label(), "contact.name");
//! ```

pub mod completion;
pub mod context;
pub mod errors;
pub mod functions;
pub mod insertion;
pub mod resolver;
pub mod scanner;
pub mod schema;

pub use completion::{Completer, CompleterConfig, CompletionOption, Suggestions};
pub use context::{extract_query, locate, QueryContext};
pub use errors::{TempletError, TempletResult};
pub use functions::{find_function, load_functions, match_signatures, Function};
pub use insertion::{plan, Insertion};
pub use resolver::{resolve, resolve_from};
pub use scanner::{function_context, Expression, ScanState, Scanner};
pub use schema::{KeyedAssets, Property, Schema, TypeDef};
