//! sirocco-core: stencil translation core library.
//!
//! Provides the resolve/fold/translate pipeline from host stencil
//! definitions ([`ast::Module`]) to validated Sirocco IR units.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`translate_unit()`] -- translate every marked definition of a module
//! - [`translate_stencil()`] -- translate a single definition
//! - [`TranslationError`] -- syntax/semantic/internal error taxonomy
//! - [`Externals`], [`CapturedValue`] -- the embedder's captured bindings
//! - [`Builtin`] -- the vocabulary a stencil closes over
//!
//! Individual pass entry functions are also re-exported for selective
//! pipeline execution.

pub mod ast;
pub mod builtins;
pub mod context;
pub mod error;
pub mod grammar;
pub mod matcher;
pub mod passes;
pub mod scope;

// ── Convenience re-exports: key types ────────────────────────────────

pub use builtins::Builtin;
pub use error::TranslationError;
pub use passes::symbol_resolution::{CapturedValue, Externals};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use passes::constant_folder::constant_fold;
pub use passes::pipeline::{translate_stencil, translate_unit};
pub use passes::symbol_resolution::resolve_symbols;
