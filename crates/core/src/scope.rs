//! Layered symbol tables.
//!
//! A [`ScopeChain`] is a stack of frames; the top frame is the
//! innermost scope and each frame's parent is the one below it. What a
//! frame permits is a pure function of its [`ScopeKind`]: declaration
//! kinds accept new bindings, captured kinds are read-only, and only
//! the captured kinds may be shadowed by inner frames.
//!
//! Frames enumerate their local bindings in insertion order; the
//! translator relies on this when it re-derives a stencil's field list
//! from its declaration frames.

use indexmap::IndexMap;

use crate::error::TranslationError;

/// What a scope level is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The host-builtin vocabulary. Read-only, shadowable.
    Builtin,
    /// Values captured from the embedding context (enclosing globals or
    /// lexical closure). Read-only, shadowable.
    Captured,
    /// Field declarations (API parameters, temporaries). Accepts
    /// bindings, must not be shadowed.
    Declaration,
    /// A lexical block's own bindings (a vertical region's iteration
    /// variable). Accepts bindings, must not be shadowed.
    BlockLocal,
}

impl ScopeKind {
    /// Whether program text may introduce bindings into this scope.
    pub fn can_add(self) -> bool {
        matches!(self, ScopeKind::Declaration | ScopeKind::BlockLocal)
    }

    /// Whether an inner scope may rebind a name held by this scope.
    pub fn allows_shadowing(self) -> bool {
        matches!(self, ScopeKind::Builtin | ScopeKind::Captured)
    }
}

/// One frame of bindings.
#[derive(Debug, Clone)]
pub struct Scope<T> {
    kind: ScopeKind,
    symbols: IndexMap<String, T>,
}

impl<T> Scope<T> {
    fn new(kind: ScopeKind, symbols: IndexMap<String, T>) -> Scope<T> {
        Scope { kind, symbols }
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn fetch(&self, name: &str) -> Option<&T> {
        self.symbols.get(name)
    }

    /// Local bindings in insertion order.
    pub fn locals(&self) -> impl Iterator<Item = (&str, &T)> {
        self.symbols.iter().map(|(name, symbol)| (name.as_str(), symbol))
    }
}

/// A stack of scopes; the last frame is the innermost.
#[derive(Debug, Clone)]
pub struct ScopeChain<T> {
    frames: Vec<Scope<T>>,
}

impl<T> ScopeChain<T> {
    pub fn new() -> ScopeChain<T> {
        ScopeChain { frames: Vec::new() }
    }

    /// Opens an empty scope of the given kind.
    pub fn push(&mut self, kind: ScopeKind) {
        self.frames.push(Scope::new(kind, IndexMap::new()));
    }

    /// Opens a pre-seeded scope. This is how the read-only kinds get
    /// their bindings, since `try_add` refuses them.
    pub fn push_with(&mut self, kind: ScopeKind, symbols: IndexMap<String, T>) {
        self.frames.push(Scope::new(kind, symbols));
    }

    /// Closes the innermost scope, returning it.
    pub fn pop(&mut self) -> Option<Scope<T>> {
        self.frames.pop()
    }

    pub fn frames(&self) -> &[Scope<T>] {
        &self.frames
    }

    pub fn contains(&self, name: &str) -> bool {
        self.frames.iter().any(|frame| frame.contains(name))
    }

    /// Innermost binding of `name`, searching outward.
    pub fn fetch(&self, name: &str) -> Option<&T> {
        self.frames.iter().rev().find_map(|frame| frame.fetch(name))
    }

    /// Declares `name` in the innermost scope. Fails when the scope is
    /// read-only, when the name is already bound there, or when the
    /// name would shadow a binding in a scope that forbids it.
    pub fn try_add(&mut self, name: &str, symbol: T) -> Result<(), TranslationError> {
        let Some((top, outer)) = self.frames.split_last_mut() else {
            return Err(TranslationError::internal("declaration outside any scope"));
        };
        if !top.kind.can_add() {
            return Err(TranslationError::semantic(format!(
                "'{name}' cannot be declared in this scope"
            )));
        }
        if top.contains(name) {
            return Err(TranslationError::semantic(format!(
                "'{name}' is already declared in this scope"
            )));
        }
        for frame in outer.iter().rev() {
            if !frame.kind.allows_shadowing() && frame.contains(name) {
                return Err(TranslationError::semantic(format!(
                    "'{name}' illegally shadows an existing declaration"
                )));
            }
        }
        top.symbols.insert(name.to_string(), symbol);
        Ok(())
    }
}

impl<T> Default for ScopeChain<T> {
    fn default() -> Self {
        ScopeChain::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(names: &[&str]) -> IndexMap<String, u32> {
        names.iter().enumerate().map(|(i, n)| (n.to_string(), i as u32)).collect()
    }

    #[test]
    fn kind_rules() {
        assert!(!ScopeKind::Builtin.can_add());
        assert!(!ScopeKind::Captured.can_add());
        assert!(ScopeKind::Declaration.can_add());
        assert!(ScopeKind::BlockLocal.can_add());
        assert!(ScopeKind::Builtin.allows_shadowing());
        assert!(ScopeKind::Captured.allows_shadowing());
        assert!(!ScopeKind::Declaration.allows_shadowing());
        assert!(!ScopeKind::BlockLocal.allows_shadowing());
    }

    #[test]
    fn fetch_prefers_the_innermost_binding() {
        let mut chain: ScopeChain<u32> = ScopeChain::new();
        chain.push_with(ScopeKind::Builtin, seeded(&["edge"]));
        chain.push(ScopeKind::Declaration);
        chain.try_add("edge", 7).expect("shadowing a builtin is legal");
        assert_eq!(chain.fetch("edge"), Some(&7));
    }

    #[test]
    fn duplicate_local_declaration_is_rejected() {
        let mut chain: ScopeChain<u32> = ScopeChain::new();
        chain.push(ScopeKind::Declaration);
        chain.try_add("a", 0).unwrap();
        let err = chain.try_add("a", 1).unwrap_err();
        assert!(err.to_string().contains("already declared"), "unexpected: {err}");
    }

    #[test]
    fn shadowing_a_declaration_frame_is_rejected() {
        let mut chain: ScopeChain<u32> = ScopeChain::new();
        chain.push(ScopeKind::Declaration);
        chain.try_add("a", 0).unwrap();
        chain.push(ScopeKind::BlockLocal);
        let err = chain.try_add("a", 1).unwrap_err();
        assert!(err.to_string().contains("illegally shadows"), "unexpected: {err}");
    }

    #[test]
    fn read_only_scopes_refuse_additions() {
        let mut chain: ScopeChain<u32> = ScopeChain::new();
        chain.push_with(ScopeKind::Captured, IndexMap::new());
        assert!(chain.try_add("dt", 0).is_err());
    }

    #[test]
    fn locals_enumerate_in_insertion_order() {
        let mut chain: ScopeChain<u32> = ScopeChain::new();
        chain.push(ScopeKind::Declaration);
        for name in ["c", "a", "b"] {
            chain.try_add(name, 0).unwrap();
        }
        let frame = chain.pop().unwrap();
        let names: Vec<&str> = frame.locals().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn popping_restores_the_outer_binding() {
        let mut chain: ScopeChain<u32> = ScopeChain::new();
        chain.push_with(ScopeKind::Builtin, seeded(&["k"]));
        chain.push(ScopeKind::BlockLocal);
        chain.try_add("k", 9).unwrap();
        assert_eq!(chain.fetch("k"), Some(&9));
        chain.pop();
        assert_eq!(chain.fetch("k"), Some(&0));
    }
}
