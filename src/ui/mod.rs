//! Terminal output: the live per-asset reporter, the banner and summary
//! lines around it, and confirmation prompts.

pub mod console;
pub mod prompt;
pub mod reporter;
