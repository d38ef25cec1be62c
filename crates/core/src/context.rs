//! Iteration-context tracking and field-access classification.
//!
//! Translation of a stencil body moves through three nested iteration
//! shapes: a vertical region, at most one sparse-fill loop, and
//! arbitrarily nested reductions. This module owns that state (three
//! flags plus the stack of active neighbor chains), enforces the legal
//! transitions, and decides for every field access whether it targets
//! the per-neighbor slot or the walk's source entity.
//!
//! Every `enter_*` has a matching `exit_*` that the caller must run on
//! all paths, including error paths; a reduction's exit takes back the
//! token its enter produced, since reductions nest and must restore the
//! flag value they found.

use sirocco_ir::{
    chain_is_ambiguous, chain_to_string, HorizontalOffset, LocationChain, LocationType,
};

use crate::error::TranslationError;

/// Proof of an entered reduction context; hand it back to
/// [`IterationContext::exit_reduction`].
#[must_use]
#[derive(Debug)]
pub struct ReductionToken {
    prior_in_reduction: bool,
}

#[derive(Debug, Default)]
pub struct IterationContext {
    in_vertical_region: bool,
    in_loop_stmt: bool,
    in_reduction: bool,
    neighbor_chains: Vec<LocationChain>,
}

impl IterationContext {
    pub fn new() -> IterationContext {
        IterationContext::default()
    }

    pub fn in_vertical_region(&self) -> bool {
        self.in_vertical_region
    }

    pub fn in_loop_stmt(&self) -> bool {
        self.in_loop_stmt
    }

    pub fn in_reduction(&self) -> bool {
        self.in_reduction
    }

    /// The innermost active neighbor chain, if any.
    pub fn current_chain(&self) -> Option<&[LocationType]> {
        self.neighbor_chains.last().map(|chain| chain.as_slice())
    }

    fn check_chain(chain: &[LocationType]) -> Result<(), TranslationError> {
        if chain.len() > 1 {
            Ok(())
        } else {
            Err(TranslationError::semantic(format!(
                "a neighbor chain needs at least two locations, found '{}'",
                chain_to_string(chain)
            )))
        }
    }

    pub fn enter_vertical_region(&mut self) -> Result<(), TranslationError> {
        if self.in_vertical_region {
            return Err(TranslationError::semantic("vertical regions cannot be nested"));
        }
        if self.in_loop_stmt || self.in_reduction {
            return Err(TranslationError::semantic(
                "a vertical region cannot start inside a neighbor iteration",
            ));
        }
        self.in_vertical_region = true;
        Ok(())
    }

    pub fn exit_vertical_region(&mut self) {
        self.in_vertical_region = false;
    }

    pub fn enter_loop_stmt(&mut self, chain: LocationChain) -> Result<(), TranslationError> {
        if !self.in_vertical_region {
            return Err(TranslationError::semantic(
                "sparse fills are only allowed inside a vertical region",
            ));
        }
        if self.in_loop_stmt {
            return Err(TranslationError::semantic("sparse fills cannot be nested"));
        }
        if self.in_reduction {
            return Err(TranslationError::semantic(
                "a sparse fill cannot start inside a reduction",
            ));
        }
        Self::check_chain(&chain)?;
        self.in_loop_stmt = true;
        self.neighbor_chains.push(chain);
        Ok(())
    }

    pub fn exit_loop_stmt(&mut self) {
        self.in_loop_stmt = false;
        self.neighbor_chains.pop();
    }

    pub fn enter_reduction(
        &mut self,
        chain: LocationChain,
    ) -> Result<ReductionToken, TranslationError> {
        if !self.in_vertical_region {
            return Err(TranslationError::semantic(
                "reductions are only allowed inside a vertical region",
            ));
        }
        Self::check_chain(&chain)?;
        let token = ReductionToken { prior_in_reduction: self.in_reduction };
        self.in_reduction = true;
        self.neighbor_chains.push(chain);
        Ok(token)
    }

    pub fn exit_reduction(&mut self, token: ReductionToken) {
        self.in_reduction = token.prior_in_reduction;
        self.neighbor_chains.pop();
    }

    /// Classifies one field access. `field_chain` is the field's
    /// declared horizontal shape (`None` for purely vertical fields),
    /// `qualifier` the explicit location chain written at the access
    /// site, if any.
    ///
    /// The rules, in priority order:
    /// 1. outside any neighbor iteration a qualifier is illegal and
    ///    every access is center;
    /// 2. unqualified: sparse fields default to the neighbor slot;
    ///    dense fields under an ambiguous chain are an error, otherwise
    ///    they hit the neighbor slot exactly when their location is the
    ///    chain's last element; purely vertical fields stay center;
    /// 3. a qualifier of length one must name the chain's first element
    ///    and yields center;
    /// 4. a qualifier equal to the whole active chain yields the
    ///    neighbor slot; any other qualifier is illegal.
    pub fn horizontal_offset(
        &self,
        field_chain: Option<&[LocationType]>,
        qualifier: Option<&[LocationType]>,
    ) -> Result<HorizontalOffset, TranslationError> {
        let Some(active) = self.current_chain() else {
            if qualifier.is_some() {
                return Err(TranslationError::semantic(
                    "location qualifiers are only legal inside a neighbor iteration",
                ));
            }
            return Ok(HorizontalOffset::Center);
        };

        let Some(qualifier) = qualifier else {
            let Some(declared) = field_chain else {
                return Ok(HorizontalOffset::Center);
            };
            if declared.len() > 1 {
                return Ok(HorizontalOffset::Neighbor);
            }
            if chain_is_ambiguous(active) {
                return Err(TranslationError::semantic(format!(
                    "the neighbor chain '{}' is ambiguous; qualify the access explicitly",
                    chain_to_string(active)
                )));
            }
            return if declared.first() == active.last() {
                Ok(HorizontalOffset::Neighbor)
            } else {
                Ok(HorizontalOffset::Center)
            };
        };

        if qualifier.len() == 1 {
            return if qualifier.first() == active.first() {
                Ok(HorizontalOffset::Center)
            } else {
                Err(TranslationError::semantic(format!(
                    "a single-location qualifier must name '{}', the start of the active \
                     chain, found '{}'",
                    active[0],
                    chain_to_string(qualifier)
                )))
            };
        }

        if qualifier == active {
            Ok(HorizontalOffset::Neighbor)
        } else {
            Err(TranslationError::semantic(format!(
                "qualifier '{}' does not match the active neighbor chain '{}'",
                chain_to_string(qualifier),
                chain_to_string(active)
            )))
        }
    }
}
