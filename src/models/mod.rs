//! Sorption and reaction models
//!
//! These are the concentration-dependent closures of the transport equation,
//! written as small tagged variants with pure evaluation functions:
//!
//! - [`SorptionModel`]: one per (component, chemical) pair. Gives the
//!   effective partition coefficient `K(C)`, its Newton derivative `dq/dC`
//!   and the sorbed concentration, and derives the sorption/desorption
//!   reactions of kinetic pairs.
//! - [`ReactionNetwork`]: user reactions plus the derived sorption
//!   reactions, classified once into linear and nonlinear terms.
//! - [`SpeciesTable`]: the transported unknowns, dissolved chemicals first,
//!   then one sorbed species per kinetic pair.

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod reactions;
pub mod sorption;
pub mod species;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use reactions::{Participant, RateConstant, RateLaw, RateScale, ReactionNetwork, ReactionTerm};
pub use sorption::{Isotherm, Kinetics, SorptionModel};
pub use species::{Species, SpeciesTable};
