//! Routing - mapping a query to tools, a direct answer, or a question.
//!
//! The model's output is a [`RouteProposal`]; it is untrusted until
//! [`resolve_calls`] has validated every call against the tool catalogue.
//! The validated result is a [`RoutingDecision`].

mod decision;
mod hints;
mod prompt;
mod proposal;
mod resolver;

pub use decision::{InvocationSet, RoutingAmbiguity, RoutingDecision};
pub use hints::{detect_hints, render_hints, Hint};
pub use prompt::{build_system_prompt, build_user_prompt};
pub use proposal::{ProposalParseError, ProposedCall, RouteProposal};
pub use resolver::{resolve_calls, CallRejection, Resolution};
