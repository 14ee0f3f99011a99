//! Tool abstractions for LLM function-calling agents.
//!
//! Every capability the model can use is a [`Tool`] implementor, registered
//! explicitly in a [`ToolSet`] which handles dispatch, validation,
//! truncation, and timeouts.
//!
//! - **[`FnTool`]**: closure-based, auto-parses arguments. Best for
//!   stateless tools.
//! - **`impl Tool`**: a struct with its own [`Tool::definition()`] and
//!   [`Tool::execute()`], for tools holding stores or clients.
//!
//! [`spec`] provides the [`ToolSpec`](spec::ToolSpec) builder for
//! descriptions with `when_to_use` / `when_not_to_use` guidance.

pub mod core;
pub mod spec;

pub use core::{
    FnTool, Tool, ToolError, ToolFuture, ToolSet, parse_tool_args, truncate_result,
    validate_tool_arguments,
};
pub use spec::ToolSpec;
