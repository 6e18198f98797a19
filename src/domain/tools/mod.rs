//! Tools - retrieval capability contracts.
//!
//! A tool is described by a [`ToolDefinition`] (name, description,
//! [`ParameterSchema`], specificity). The router turns model output into
//! [`ToolInvocation`]s by validating against the definition; executing an
//! invocation yields [`RetrievalRecord`]s.

mod parameter_schema;
mod retrieval_record;
mod tool_definition;
mod tool_invocation;
mod tool_status;

pub use parameter_schema::{ParamSpec, ParamType, ParameterSchema, ToolParameters, DATE_FORMAT};
pub use retrieval_record::{ContentKind, RetrievalRecord};
pub use tool_definition::{Specificity, ToolDefinition};
pub use tool_invocation::ToolInvocation;
pub use tool_status::ToolRunStatus;
