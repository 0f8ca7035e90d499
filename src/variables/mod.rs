//! # Variables
//!
//! Hard (`{@name}`) and soft (`{?name}`) placeholders: finding them in the
//! request-bearing documents, asking for their values, remembering hard
//! values in the `variables` document, and substituting before each call.

pub mod detection;
pub mod prompt;
pub mod resolve;

pub use detection::{
    detect_variable, find_all_variables, find_variables_in_document, variable_key, VariableInfo,
    VariableKind, VariableMap,
};
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use resolve::{
    prompt_for_specific, prompt_for_variables, store_variable_info, substitute_variables,
    Substitutions,
};
