//! Scenario suite configuration types
//!
//! Defines the data structures for deserializing YAML scenario suites,
//! plus the built-in Schwarz cubes suite used when no file is given.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

use super::check::Criterion;

/// Placeholder in command arguments replaced by the scenario input file
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// A complete scenario suite loaded from a YAML file
#[derive(Deserialize, Debug, Clone)]
pub struct Suite {
    /// Name of the suite
    pub name: String,
    /// Optional description of what the suite verifies
    pub description: Option<String>,
    /// Directory the simulation runs in, relative to the suite file
    pub working_dir: Option<PathBuf>,
    /// How to invoke the simulation
    pub command: Option<CommandConfig>,
    /// Marker text preceding the checked value
    pub marker: Option<String>,
    /// Kill a simulation after this many seconds
    pub timeout_secs: Option<u64>,
    /// Scenarios, run in order
    pub scenarios: Vec<Scenario>,
    /// Directory containing the suite file
    #[serde(skip)]
    pub source_dir: PathBuf,
}

/// Simulation command line
#[derive(Deserialize, Debug, Clone)]
pub struct CommandConfig {
    /// Executable; falls back to the runner config when unset
    pub program: Option<PathBuf>,
    /// Arguments, with `{input}` substituted per scenario
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

fn default_args() -> Vec<String> {
    vec![INPUT_PLACEHOLDER.to_string()]
}

/// One named regression case
#[derive(Deserialize, Debug, Clone)]
pub struct Scenario {
    /// Scenario name, also the log file stem
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Input deck handed to the simulation
    pub input: PathBuf,
    /// Known-good value
    pub reference: f64,
    /// Allowed deviation on either side of the reference
    pub tolerance: f64,
    /// Marker override for this scenario
    pub marker: Option<String>,
}

impl Scenario {
    /// Acceptance criterion for this scenario
    pub fn criterion(&self) -> Criterion {
        Criterion::new(self.reference, self.tolerance)
    }
}

impl Suite {
    /// Load and validate a suite from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        let source_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Self::parse(&content, source_dir)
    }

    /// Parse and validate a suite from YAML text
    pub fn parse(content: &str, source_dir: &Path) -> Result<Self> {
        let mut suite: Suite = serde_yaml::from_str(content)?;
        suite.source_dir = source_dir.to_path_buf();
        suite.validate()?;
        Ok(suite)
    }

    /// The Schwarz coupled cubes suite: Dirichlet and Schwarz-Dirichlet
    /// boundary conditions, both driven by `cubes.yaml`
    pub fn builtin() -> Self {
        let cubes = |name: &str, reference: f64| Scenario {
            name: name.to_string(),
            description: None,
            input: PathBuf::from("cubes.yaml"),
            reference,
            tolerance: 1.0e-9,
            marker: None,
        };

        Self {
            name: "Schwarz_Cubes".to_string(),
            description: Some("Schwarz coupled cubes, mean value of the final solution".to_string()),
            working_dir: None,
            command: None,
            marker: None,
            timeout_secs: None,
            scenarios: vec![
                cubes("Cubes_DBC", 0.000809523809524),
                cubes("Cubes_SDBC", 0.000809523809521),
            ],
            source_dir: PathBuf::from("."),
        }
    }

    /// Load the suite at `path`, or the built-in suite
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Check structural invariants
    pub fn validate(&self) -> Result<()> {
        if self.scenarios.is_empty() {
            return Err(Error::invalid_suite(&self.name, "no scenarios defined"));
        }

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            let name = scenario.name.as_str();
            if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
                return Err(Error::invalid_suite(
                    &self.name,
                    format!("scenario name '{}' cannot be used as a log file name", name),
                ));
            }
            if !seen.insert(name) {
                return Err(Error::invalid_suite(
                    &self.name,
                    format!("duplicate scenario '{}'", name),
                ));
            }
            if !scenario.reference.is_finite() {
                return Err(Error::invalid_suite(
                    &self.name,
                    format!("scenario '{}' has a non-finite reference", name),
                ));
            }
            if !scenario.tolerance.is_finite() || scenario.tolerance < 0.0 {
                return Err(Error::invalid_suite(
                    &self.name,
                    format!("scenario '{}' needs a finite, non-negative tolerance", name),
                ));
            }
            if matches!(&scenario.marker, Some(m) if m.trim().is_empty()) {
                return Err(Error::invalid_suite(
                    &self.name,
                    format!("scenario '{}' has an empty marker", name),
                ));
            }
        }

        if matches!(&self.marker, Some(m) if m.trim().is_empty()) {
            return Err(Error::invalid_suite(&self.name, "empty marker"));
        }

        Ok(())
    }

    /// Look up a scenario by name
    pub fn scenario(&self, name: &str) -> Result<&Scenario> {
        self.scenarios
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::unknown_scenario(name, &self.scenario_names()))
    }

    /// Select scenarios by name, keeping suite order; empty selects all
    pub fn select(&self, names: &[String]) -> Result<Vec<&Scenario>> {
        if names.is_empty() {
            return Ok(self.scenarios.iter().collect());
        }
        for name in names {
            self.scenario(name)?;
        }
        Ok(self
            .scenarios
            .iter()
            .filter(|s| names.contains(&s.name))
            .collect())
    }

    /// Names of all scenarios, in order
    pub fn scenario_names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name.as_str()).collect()
    }

    /// Directory the simulation runs in
    pub fn work_dir(&self) -> PathBuf {
        match &self.working_dir {
            Some(dir) => self.source_dir.join(dir),
            None => self.source_dir.clone(),
        }
    }

    /// Command arguments for `scenario`
    pub fn args_for(&self, scenario: &Scenario) -> Vec<String> {
        let template = self
            .command
            .as_ref()
            .map(|c| c.args.clone())
            .unwrap_or_else(default_args);
        let input = scenario.input.to_string_lossy();
        template
            .iter()
            .map(|arg| arg.replace(INPUT_PLACEHOLDER, &input))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE: &str = r#"
name: Schwarz_Cubes
description: Coupled cubes
working_dir: run
command:
  program: ./AlbanyT
  args: ["--verbose", "{input}"]
timeout_secs: 120
scenarios:
  - name: Cubes_DBC
    input: cubes.yaml
    reference: 0.000809523809524
    tolerance: 1.0e-9
  - name: Cubes_SDBC
    input: cubes_sdbc.yaml
    reference: 0.000809523809521
    tolerance: 1.0e-9
    marker: "MeanValue:"
"#;

    #[test]
    fn test_parse_suite() {
        let suite = Suite::parse(SUITE, Path::new("/tests/cubes")).unwrap();
        assert_eq!(suite.name, "Schwarz_Cubes");
        assert_eq!(suite.scenarios.len(), 2);
        assert_eq!(suite.timeout_secs, Some(120));
        assert_eq!(suite.work_dir(), PathBuf::from("/tests/cubes/run"));
        assert_eq!(suite.scenarios[1].marker.as_deref(), Some("MeanValue:"));
    }

    #[test]
    fn test_args_substitute_input() {
        let suite = Suite::parse(SUITE, Path::new(".")).unwrap();
        let args = suite.args_for(&suite.scenarios[1]);
        assert_eq!(args, vec!["--verbose", "cubes_sdbc.yaml"]);
    }

    #[test]
    fn test_default_args_are_input_only() {
        let suite = Suite::builtin();
        assert_eq!(suite.args_for(&suite.scenarios[0]), vec!["cubes.yaml"]);
    }

    #[test]
    fn test_builtin_suite() {
        let suite = Suite::builtin();
        suite.validate().unwrap();
        assert_eq!(suite.scenario_names(), vec!["Cubes_DBC", "Cubes_SDBC"]);
        assert_eq!(suite.scenarios[0].reference, 0.000809523809524);
        assert_eq!(suite.scenarios[1].reference, 0.000809523809521);
        assert!(suite.scenarios.iter().all(|s| s.tolerance == 1.0e-9));
        assert_eq!(suite.work_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_select_keeps_suite_order() {
        let suite = Suite::builtin();
        let names = vec!["Cubes_SDBC".to_string(), "Cubes_DBC".to_string()];
        let selected = suite.select(&names).unwrap();
        assert_eq!(selected[0].name, "Cubes_DBC");
        assert_eq!(selected[1].name, "Cubes_SDBC");

        assert_eq!(suite.select(&[]).unwrap().len(), 2);
    }

    #[test]
    fn test_select_unknown_scenario() {
        let suite = Suite::builtin();
        let err = suite.select(&["Cubes_NBC".to_string()]).unwrap_err();
        assert!(matches!(err, Error::UnknownScenario { .. }));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let yaml = r#"
name: dup
scenarios:
  - { name: A, input: a.yaml, reference: 1.0, tolerance: 0.1 }
  - { name: A, input: b.yaml, reference: 1.0, tolerance: 0.1 }
"#;
        let err = Suite::parse(yaml, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("duplicate scenario 'A'"));
    }

    #[test]
    fn test_rejects_path_like_names() {
        let yaml = r#"
name: bad
scenarios:
  - { name: "../escape", input: a.yaml, reference: 1.0, tolerance: 0.1 }
"#;
        assert!(Suite::parse(yaml, Path::new(".")).is_err());
    }

    #[test]
    fn test_rejects_negative_tolerance() {
        let yaml = r#"
name: bad
scenarios:
  - { name: A, input: a.yaml, reference: 1.0, tolerance: -0.1 }
"#;
        assert!(Suite::parse(yaml, Path::new(".")).is_err());
    }

    #[test]
    fn test_rejects_empty_suite() {
        let err = Suite::parse("name: empty\nscenarios: []\n", Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("no scenarios"));
    }

    #[test]
    fn test_malformed_yaml_is_yaml_error() {
        let err = Suite::parse("name: [unclosed", Path::new(".")).unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }
}
