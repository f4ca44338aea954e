//! Common utilities for integration tests
#![allow(dead_code)]

pub mod scenarios;
pub mod test_helpers;

// Re-export commonly used items
pub use scenarios::{
    DENSITY, DW, DW_PER_YEAR, POROSITY, reference_scenario, sand_cap, sealed_top, single_chemical,
};
pub use test_helpers::{
    assert_profiles_close,
    compute_l2_error,
    erfc,
    init_logging,
    inventory,
    relative_error,
    trapezoid,
};
