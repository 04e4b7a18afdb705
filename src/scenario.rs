//! Scenario descriptors - the declarative model the engine executes
//!
//! A scenario is an ordered list of field assignments, an optional trigger
//! action, and a list of expectations against output fields. Scenarios are
//! built in code (see `suite`) or parsed from YAML specs. A YAML spec may
//! carry a parameter table; expansion substitutes `{key}` placeholders and
//! yields one concrete scenario per row, so each row gets its own verdict.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{VerifyError, VerifyResult};

/// How a field assignment is applied to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentKind {
    /// Text input, applied via `set_field`
    Fill,
    /// Single-select, applied via `select_option`
    Select,
}

/// One input-field write within a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldAssignment {
    pub field: String,
    pub value: String,
    pub kind: AssignmentKind,
}

impl FieldAssignment {
    pub fn fill(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            kind: AssignmentKind::Fill,
        }
    }

    pub fn select(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            kind: AssignmentKind::Select,
        }
    }
}

/// Pass threshold for one expectation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// Percent of the expected value; suits multi-factor conversions where
    /// downstream rounding shifts large magnitudes.
    Relative(f64),
    /// Fixed numeric delta; suits single-factor exact arithmetic.
    Absolute(f64),
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Relative(0.5)
    }
}

/// One output-field/expected-value/tolerance triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expectation {
    /// Verdict name for this assertion; defaults to the scenario name.
    pub label: Option<String>,
    pub output_field: String,
    pub expected: f64,
    pub tolerance: Tolerance,
    /// Emission factor behind the expected value, carried into the verdict.
    pub factor: Option<f64>,
}

/// Immutable descriptor of one test scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Reload the document before running (fresh state).
    pub isolated: bool,
    /// Re-read assigned fields and fail the scenario if values did not stick.
    pub verify_retention: bool,
    pub assignments: Vec<FieldAssignment>,
    /// Selector of the action element; `None` for retention-only scenarios.
    pub trigger: Option<String>,
    /// Selector that becomes visible once results are ready.
    pub results_marker: Option<String>,
    pub expectations: Vec<Expectation>,
}

/// YAML-facing scenario spec, prior to table expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_isolated")]
    pub isolated: bool,

    #[serde(default)]
    pub verify_retention: bool,

    #[serde(default)]
    pub assignments: Vec<AssignmentSpec>,

    #[serde(default)]
    pub trigger: Option<String>,

    #[serde(default)]
    pub results_marker: Option<String>,

    #[serde(default)]
    pub expectations: Vec<ExpectationSpec>,

    /// Parameter rows; `{key}` placeholders elsewhere in the spec are
    /// replaced per row. Empty means a single concrete scenario.
    #[serde(default)]
    pub table: Vec<BTreeMap<String, String>>,
}

fn default_isolated() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSpec {
    pub field: String,
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(default)]
    pub select: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectationSpec {
    #[serde(default)]
    pub label: Option<String>,
    pub output: String,
    pub expected: String,
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub tolerance: Option<Tolerance>,
    #[serde(default)]
    pub factor: Option<String>,
}

impl ScenarioSpec {
    pub fn from_yaml(yaml: &str) -> VerifyResult<Self> {
        serde_yaml::from_str(yaml).map_err(VerifyError::from)
    }

    pub fn from_file(path: &Path) -> VerifyResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load all scenario specs under `dir`, in stable path order.
    pub fn load_all(dir: &Path) -> VerifyResult<Vec<Self>> {
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect();
        paths.sort();

        let mut specs = Vec::new();
        for path in paths {
            specs.push(Self::from_file(&path)?);
        }
        Ok(specs)
    }

    /// Expand the spec into concrete scenarios, one per table row.
    pub fn expand(&self) -> VerifyResult<Vec<Scenario>> {
        if self.table.is_empty() {
            let row = BTreeMap::new();
            return Ok(vec![self.expand_row(&row, None)?]);
        }

        let mut scenarios = Vec::with_capacity(self.table.len());
        for (i, row) in self.table.iter().enumerate() {
            scenarios.push(self.expand_row(row, Some(i))?);
        }
        Ok(scenarios)
    }

    fn expand_row(
        &self,
        row: &BTreeMap<String, String>,
        index: Option<usize>,
    ) -> VerifyResult<Scenario> {
        let mut name = substitute(&self.name, row);
        // A table without a placeholder in the name still needs unique
        // scenario names.
        if let Some(i) = index {
            if name == self.name && self.table.len() > 1 {
                name = format!("{} #{}", name, i + 1);
            }
        }

        let mut assignments = Vec::with_capacity(self.assignments.len());
        for a in &self.assignments {
            let field = substitute(&a.field, row);
            let assignment = match (&a.fill, &a.select) {
                (Some(v), None) => FieldAssignment::fill(field, substitute(v, row)),
                (None, Some(v)) => FieldAssignment::select(field, substitute(v, row)),
                _ => {
                    return Err(VerifyError::SpecParse(format!(
                        "assignment for {} must have exactly one of fill/select",
                        a.field
                    )))
                }
            };
            assignments.push(assignment);
        }

        let mut expectations = Vec::with_capacity(self.expectations.len());
        for e in &self.expectations {
            let expected_text = substitute(&e.expected, row);
            let expected = expected_text.parse::<f64>().map_err(|_| {
                VerifyError::SpecParse(format!(
                    "expected value for {} is not numeric: {:?}",
                    e.output, expected_text
                ))
            })?;

            let factor = match &e.factor {
                Some(f) => {
                    let text = substitute(f, row);
                    Some(text.parse::<f64>().map_err(|_| {
                        VerifyError::SpecParse(format!(
                            "factor for {} is not numeric: {:?}",
                            e.output, text
                        ))
                    })?)
                }
                None => None,
            };

            expectations.push(Expectation {
                label: e.label.as_ref().map(|l| substitute(l, row)),
                output_field: substitute(&e.output, row),
                expected,
                tolerance: e.tolerance.unwrap_or_default(),
                factor,
            });
        }

        Ok(Scenario {
            name,
            description: substitute(&self.description, row),
            isolated: self.isolated,
            verify_retention: self.verify_retention,
            assignments,
            trigger: self.trigger.as_ref().map(|t| substitute(t, row)),
            results_marker: self.results_marker.as_ref().map(|m| substitute(m, row)),
            expectations,
        })
    }
}

/// Replace every `{key}` placeholder with the row's value for `key`.
fn substitute(template: &str, row: &BTreeMap<String, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in row {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_spec() {
        let yaml = r#"
name: natural-gas-scope1
description: Scope 1 natural gas conversion
assignments:
  - field: '#state'
    select: NSW
  - field: '#January-naturalGas'
    fill: '1000'
trigger: '#calculateEmissions'
results_marker: '#results'
expectations:
  - output: '#scope1Total'
    expected: '2.025'
    tolerance:
      relative: 0.5
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.name, "natural-gas-scope1");
        assert!(spec.isolated);

        let scenarios = spec.expand().unwrap();
        assert_eq!(scenarios.len(), 1);
        let s = &scenarios[0];
        assert_eq!(s.assignments.len(), 2);
        assert_eq!(s.assignments[0].kind, AssignmentKind::Select);
        assert_eq!(s.trigger.as_deref(), Some("#calculateEmissions"));
        assert_eq!(s.expectations[0].expected, 2.025);
        assert_eq!(s.expectations[0].tolerance, Tolerance::Relative(0.5));
    }

    #[test]
    fn table_expands_to_one_scenario_per_row() {
        let yaml = r#"
name: '{label} electricity'
assignments:
  - field: '#state'
    select: '{state}'
  - field: '#January-electricity'
    fill: '10000'
trigger: '#calculateEmissions'
results_marker: '#results'
expectations:
  - label: '{label} electricity'
    output: '#scope2TotalLocation'
    expected: '{expected}'
    tolerance:
      absolute: 0.01
    factor: '{factor}'
table:
  - { label: NSW/ACT, state: NSW, expected: '6.60', factor: '0.66' }
  - { label: Victoria, state: VIC, expected: '7.70', factor: '0.77' }
  - { label: Queensland, state: QLD, expected: '7.10', factor: '0.71' }
  - { label: South Australia, state: SA, expected: '2.30', factor: '0.23' }
  - { label: Tasmania, state: TAS, expected: '1.50', factor: '0.15' }
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        let scenarios = spec.expand().unwrap();
        assert_eq!(scenarios.len(), 5);

        assert_eq!(scenarios[0].name, "NSW/ACT electricity");
        assert_eq!(scenarios[0].assignments[0].value, "NSW");
        assert_eq!(scenarios[0].expectations[0].expected, 6.60);
        assert_eq!(scenarios[0].expectations[0].factor, Some(0.66));

        assert_eq!(scenarios[4].name, "Tasmania electricity");
        assert_eq!(scenarios[4].expectations[0].factor, Some(0.15));
    }

    #[test]
    fn table_rows_without_name_placeholder_get_indexed_names() {
        let yaml = r#"
name: repeated
assignments: []
table:
  - { x: '1' }
  - { x: '2' }
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        let scenarios = spec.expand().unwrap();
        assert_eq!(scenarios[0].name, "repeated #1");
        assert_eq!(scenarios[1].name, "repeated #2");
    }

    #[test]
    fn non_numeric_expected_is_a_spec_error() {
        let yaml = r#"
name: bad
expectations:
  - output: '#scope1Total'
    expected: 'lots'
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        assert!(matches!(
            spec.expand().unwrap_err(),
            VerifyError::SpecParse(_)
        ));
    }

    #[test]
    fn assignment_with_both_fill_and_select_is_rejected() {
        let yaml = r#"
name: bad
assignments:
  - field: '#state'
    fill: 'NSW'
    select: 'NSW'
"#;
        let spec = ScenarioSpec::from_yaml(yaml).unwrap();
        assert!(matches!(
            spec.expand().unwrap_err(),
            VerifyError::SpecParse(_)
        ));
    }

    #[test]
    fn load_all_reads_specs_in_path_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b-second.yaml"),
            "name: second\nassignments: []\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a-first.yml"),
            "name: first\nassignments: []\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let specs = ScenarioSpec::load_all(dir.path()).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "first");
        assert_eq!(specs[1].name, "second");
    }
}
