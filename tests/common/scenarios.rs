//! Configuration builders shared by the integration tests
//!
//! Every builder uses the default unit system (cm, year, cm²/s) and a single
//! solid component, `sand`, with porosity 0.5 and density 1.3 kg/L.

use sedcap_rs::config::*;

/// Molecular diffusivity used throughout, cm²/s
pub const DW: f64 = 1e-5;

/// `DW` in cm²/yr
pub const DW_PER_YEAR: f64 = DW * 31_557_600.0;

pub const POROSITY: f64 = 0.5;
pub const DENSITY: f64 = 1.3;

/// One-layer sand cap of `thickness` cm with `points` grid points
///
/// Tortuosity is off so the bulk diffusivity is exactly `e·Dw`.
pub fn sand_cap(options: SolverOptions, thickness: f64, points: usize) -> Config {
    Config::new(options)
        .with_component(Component::new("sand", POROSITY, DENSITY, 0.01))
        .with_matrix(Matrix::pure("sand", "sand"))
        .with_layer(Layer::new("cap", thickness, points, "sand").with_tortuosity(Tortuosity::None))
}

/// `sand_cap` with one chemical `A` and the given boundary conditions
pub fn single_chemical(
    options: SolverOptions,
    thickness: f64,
    points: usize,
    top: TopBoundary,
    bottom: BottomBoundary,
) -> Config {
    sand_cap(options, thickness, points)
        .with_chemical(Chemical::new("A", DW))
        .with_boundary(BoundaryCondition::new("A", top, bottom))
}

/// Top condition with a negligible exchange coefficient: the surface is effectively sealed
pub fn sealed_top() -> TopBoundary {
    TopBoundary::MassTransfer { coefficient: 1e-12, water_concentration: 0.0 }
}

/// The reference scenario: 10 cm, 21 points, Koc-foc sorption, clean cap under a fixed source at the top
pub fn reference_scenario() -> Config {
    Config::new(SolverOptions::new(1.0, 0.01))
        .with_chemical(Chemical::new("PCB", DW).with_molecular_weight(100.0).with_log_koc(3.0))
        .with_component(Component::new("sand", POROSITY, DENSITY, 0.01))
        .with_matrix(Matrix::pure("sand", "sand"))
        .with_layer(Layer::new("cap", 10.0, 21, "sand"))
        .with_sorption(SorptionEntry::equilibrium("sand", "PCB", IsothermSpec::LinearKocFoc { log_koc: None }))
        .with_boundary(BoundaryCondition::new(
            "PCB",
            TopBoundary::FixedConcentration { concentration: 1.0 },
            BottomBoundary::ZeroGradient,
        ))
}
