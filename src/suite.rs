//! Built-in verification suite for the emissions calculator
//!
//! Expected values are derived independently from the NGA 2024 factors, not
//! read back from the calculator: natural gas at 0.0393 GJ/m³ and
//! 0.05153 t CO₂e/GJ, and state electricity factors in kg CO₂e/kWh
//! (scaled ÷1000 to tonnes).

use crate::scenario::{Expectation, FieldAssignment, Scenario, Tolerance};

/// Energy content and emission factors for the Scope 1 natural gas check.
const GAS_ENERGY_GJ_PER_M3: f64 = 0.0393;
const GAS_TCO2E_PER_GJ: f64 = 0.05153;
const GAS_INPUT_M3: f64 = 1000.0;

/// State electricity factors (code, display name, kg CO₂e/kWh).
const STATE_FACTORS: &[(&str, &str, f64)] = &[
    ("NSW", "NSW/ACT", 0.66),
    ("VIC", "Victoria", 0.77),
    ("QLD", "Queensland", 0.71),
    ("SA", "South Australia", 0.23),
    ("TAS", "Tasmania", 0.15),
];

const ELECTRICITY_INPUT_KWH: f64 = 10_000.0;

/// The full built-in suite, in execution order.
pub fn builtin_suite() -> Vec<Scenario> {
    let mut scenarios = vec![data_entry_scenario(), natural_gas_scenario()];
    scenarios.extend(state_electricity_scenarios());
    scenarios
}

/// Form fields must accept and retain data before any calculation is worth
/// checking. Runs against the freshly loaded document, no trigger.
pub fn data_entry_scenario() -> Scenario {
    Scenario {
        name: "Basic data entry".to_string(),
        description: "Form fields accept and retain facility information".to_string(),
        isolated: false,
        verify_retention: true,
        assignments: vec![
            FieldAssignment::fill("#facilityName", "Valorem Chemicals Test Facility"),
            FieldAssignment::fill("#annualProduction", "5000"),
            FieldAssignment::select("#state", "NSW"),
            FieldAssignment::select("#reportingPeriod", "financial"),
            FieldAssignment::select("#reportingYear", "2025"),
        ],
        trigger: None,
        results_marker: None,
        expectations: vec![],
    }
}

/// Scope 1: 1000 m³ of natural gas in January. Two conversion stages, so
/// the check uses relative tolerance.
pub fn natural_gas_scenario() -> Scenario {
    let expected = GAS_INPUT_M3 * GAS_ENERGY_GJ_PER_M3 * GAS_TCO2E_PER_GJ;

    Scenario {
        name: "Natural gas calculation".to_string(),
        description: "Scope 1 natural gas conversion against NGA 2024 factors".to_string(),
        isolated: true,
        verify_retention: false,
        assignments: vec![
            FieldAssignment::select("#state", "NSW"),
            FieldAssignment::fill("#January-naturalGas", "1000"),
        ],
        trigger: Some("#calculateEmissions".to_string()),
        results_marker: Some("#results".to_string()),
        expectations: vec![Expectation {
            label: None,
            output_field: "#scope1Total".to_string(),
            expected,
            tolerance: Tolerance::Relative(0.5),
            factor: None,
        }],
    }
}

/// Scope 2: one logical check repeated across the state factor table. Each
/// row is its own isolated scenario with its own verdict, so a wrong factor
/// in one state never masks another.
pub fn state_electricity_scenarios() -> Vec<Scenario> {
    STATE_FACTORS
        .iter()
        .map(|&(code, label, factor)| {
            let expected = ELECTRICITY_INPUT_KWH * factor / 1000.0;
            Scenario {
                name: format!("{} electricity", label),
                description: format!("Scope 2 electricity at {} kg CO₂e/kWh", factor),
                isolated: true,
                verify_retention: false,
                assignments: vec![
                    FieldAssignment::select("#state", code),
                    FieldAssignment::fill("#January-electricity", "10000"),
                ],
                trigger: Some("#calculateEmissions".to_string()),
                results_marker: Some("#results".to_string()),
                expectations: vec![Expectation {
                    label: Some(format!("{} electricity", label)),
                    output_field: "#scope2TotalLocation".to_string(),
                    expected,
                    tolerance: Tolerance::Absolute(0.01),
                    factor: Some(factor),
                }],
            }
        })
        .collect()
}
