//! sirocco-ir: Shared stencil IR types.
//!
//! Provides the closed node vocabulary a translated stencil is made of
//! (location chains, fields, statements, expressions, reductions) plus
//! the `TranslationUnit` container handed to a code-generation backend.
//!
//! The front end in `sirocco-core` is the only producer; backends are
//! consumers. Every type derives `Serialize`/`Deserialize` so a unit can
//! cross a process boundary without either side re-declaring the schema.

pub mod types;

pub use types::*;
