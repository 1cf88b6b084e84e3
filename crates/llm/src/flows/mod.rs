//! The three model call sites used by dispatch.
//!
//! Output schemas use the Gemini response-schema dialect (`OBJECT`, `STRING`, `INTEGER`,
//! `NUMBER`, `ARRAY`).

pub mod condition;
pub mod recommendation;
pub mod triage;
