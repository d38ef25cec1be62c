//! The translation passes and their orchestration.
//!
//! Order is a hard requirement: [`symbol_resolution`] annotates every
//! name with its declaration, [`constant_folder`] relies on those
//! annotations to inline and collapse constants, [`resolve_globals`]
//! collects the externally supplied scalars, and [`pipeline`] threads a
//! typed state value through all of them and into the translator.

pub mod constant_folder;
pub mod pipeline;
pub mod resolve_globals;
pub mod symbol_resolution;
