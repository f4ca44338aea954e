//! Unit system and the single normalization pass
//!
//! Every dimensional input is converted once, when the configuration is
//! normalized, into the internal system:
//!
//! | Quantity     | Internal unit |
//! |--------------|---------------|
//! | length       | cm            |
//! | time         | yr (365.25 d) |
//! | diffusivity  | cm²/yr        |
//! | velocity     | cm/yr         |
//! | rate         | 1/yr          |
//!
//! Concentrations are carried in the user's unit untouched: every equation is
//! linear in concentration except the Freundlich/Langmuir isotherms, whose
//! constants are already expressed in the user's concentration unit.
//!
//! Output depths, times and fluxes are converted back with the `*_out` methods.

use serde::{Deserialize, Serialize};

const SECONDS_PER_YEAR: f64 = 365.25 * 86_400.0;

/// Length unit of depths, thicknesses and spacings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[serde(rename = "mm")]
    Millimeter,
    #[default]
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "m")]
    Meter,
}

impl LengthUnit {
    /// Size of one unit in centimetres
    pub fn centimeters(self) -> f64 {
        match self {
            LengthUnit::Millimeter => 0.1,
            LengthUnit::Centimeter => 1.0,
            LengthUnit::Meter => 100.0,
        }
    }
}

/// Time unit of the simulation window, time step and rate constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    #[serde(rename = "s")]
    Second,
    #[serde(rename = "min")]
    Minute,
    #[serde(rename = "hr")]
    Hour,
    #[serde(rename = "day")]
    Day,
    #[default]
    #[serde(rename = "yr")]
    Year,
}

impl TimeUnit {
    /// Size of one unit in years
    pub fn years(self) -> f64 {
        match self {
            TimeUnit::Second => 1.0 / SECONDS_PER_YEAR,
            TimeUnit::Minute => 60.0 / SECONDS_PER_YEAR,
            TimeUnit::Hour => 3_600.0 / SECONDS_PER_YEAR,
            TimeUnit::Day => 1.0 / 365.25,
            TimeUnit::Year => 1.0,
        }
    }
}

/// Unit of molecular and biological diffusivities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiffusivityUnit {
    #[default]
    #[serde(rename = "cm2/s")]
    SquareCentimeterPerSecond,
    #[serde(rename = "m2/s")]
    SquareMeterPerSecond,
    #[serde(rename = "cm2/yr")]
    SquareCentimeterPerYear,
}

impl DiffusivityUnit {
    /// Size of one unit in cm²/yr
    pub fn square_centimeters_per_year(self) -> f64 {
        match self {
            DiffusivityUnit::SquareCentimeterPerSecond => SECONDS_PER_YEAR,
            DiffusivityUnit::SquareMeterPerSecond => 1.0e4 * SECONDS_PER_YEAR,
            DiffusivityUnit::SquareCentimeterPerYear => 1.0,
        }
    }
}

/// Concentration unit label, carried through to the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConcentrationUnit {
    #[serde(rename = "ng/L")]
    NanogramPerLiter,
    #[serde(rename = "ug/L")]
    MicrogramPerLiter,
    #[default]
    #[serde(rename = "mg/L")]
    MilligramPerLiter,
}

/// User-facing unit system
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitSystem {
    #[serde(default)]
    pub length: LengthUnit,
    #[serde(default)]
    pub time: TimeUnit,
    #[serde(default)]
    pub concentration: ConcentrationUnit,
    #[serde(default)]
    pub diffusivity: DiffusivityUnit,
}

impl UnitSystem {
    pub fn length(&self, value: f64) -> f64 {
        value * self.length.centimeters()
    }

    pub fn time(&self, value: f64) -> f64 {
        value * self.time.years()
    }

    /// Velocities and mass-transfer coefficients (length / time)
    pub fn velocity(&self, value: f64) -> f64 {
        value * self.length.centimeters() / self.time.years()
    }

    /// First-order rate constants (1 / time)
    pub fn rate(&self, value: f64) -> f64 {
        value / self.time.years()
    }

    pub fn diffusivity(&self, value: f64) -> f64 {
        value * self.diffusivity.square_centimeters_per_year()
    }

    pub fn depth_out(&self, cm: f64) -> f64 {
        cm / self.length.centimeters()
    }

    pub fn time_out(&self, years: f64) -> f64 {
        years / self.time.years()
    }

    /// Flux from concentration·cm/yr back to concentration·length/time
    pub fn flux_out(&self, flux: f64) -> f64 {
        flux * self.time.years() / self.length.centimeters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_system_is_cm_year() {
        let units = UnitSystem::default();
        assert_eq!(units.length(3.0), 3.0);
        assert_eq!(units.time(2.0), 2.0);
        assert_eq!(units.velocity(4.0), 4.0);
    }

    #[test]
    fn test_diffusivity_cm2_per_second_to_cm2_per_year() {
        let units = UnitSystem::default();
        assert_relative_eq!(units.diffusivity(1.0e-5), 315.576, epsilon = 1e-9);
    }

    #[test]
    fn test_velocity_meters_per_day() {
        let units = UnitSystem {
            length: LengthUnit::Meter,
            time: TimeUnit::Day,
            ..Default::default()
        };
        assert_relative_eq!(units.velocity(1.0), 100.0 * 365.25, epsilon = 1e-9);
        assert_relative_eq!(units.rate(1.0), 365.25, epsilon = 1e-9);
    }

    #[test]
    fn test_output_conversion_inverts_input() {
        let units = UnitSystem {
            length: LengthUnit::Millimeter,
            time: TimeUnit::Hour,
            ..Default::default()
        };
        assert_relative_eq!(units.depth_out(units.length(7.5)), 7.5, epsilon = 1e-12);
        assert_relative_eq!(units.time_out(units.time(12.0)), 12.0, epsilon = 1e-12);
        // flux is concentration·velocity
        assert_relative_eq!(units.flux_out(units.velocity(0.3)), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_units_deserialize_from_labels() {
        let units: UnitSystem =
            serde_json::from_str(r#"{"length":"m","time":"day","diffusivity":"cm2/yr"}"#).unwrap();
        assert_eq!(units.length, LengthUnit::Meter);
        assert_eq!(units.time, TimeUnit::Day);
        assert_eq!(units.diffusivity, DiffusivityUnit::SquareCentimeterPerYear);
        assert_eq!(units.concentration, ConcentrationUnit::MilligramPerLiter);
    }
}
