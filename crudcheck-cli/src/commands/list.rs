//! `crudcheck list` command handler

use std::io::Write;

use serde::Serialize;

use crudcheck_core::config::CrudcheckConfig;

use crate::cli::ListArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};
use crate::scenarios;

/// Execute the `list` command.
pub fn execute(
    args: ListArgs,
    config: &CrudcheckConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let report = build_report(config, &args)?;
    writer.render(&report)
}

fn build_report(config: &CrudcheckConfig, args: &ListArgs) -> Result<ScenarioList, CliError> {
    let scenarios = scenarios::registry(config, &args.selection)?
        .iter()
        .map(|s| ScenarioEntry {
            id: s.id().to_owned(),
            area: s.area(),
            provider: s.provider().map(str::to_owned),
        })
        .collect();
    Ok(ScenarioList { scenarios })
}

/// Scenario listing.
#[derive(Serialize)]
pub struct ScenarioList {
    pub scenarios: Vec<ScenarioEntry>,
}

#[derive(Serialize)]
pub struct ScenarioEntry {
    pub id: String,
    pub area: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl Render for ScenarioList {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.scenarios.is_empty() {
            writeln!(w, "No scenarios match.")?;
            return Ok(());
        }

        writeln!(w, "{:<14} {}", "AREA".bold(), "SCENARIO".bold())?;
        for entry in &self.scenarios {
            writeln!(w, "{:<14} {}", entry.area, entry.id)?;
        }
        writeln!(w)?;
        writeln!(w, "{} scenarios", self.scenarios.len())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ScenarioFilter;

    fn args(filter: Option<&str>) -> ListArgs {
        ListArgs {
            selection: ScenarioFilter {
                filter: filter.map(str::to_owned),
                provider: None,
            },
        }
    }

    #[test]
    fn test_list_render_text_counts_scenarios() {
        let report = build_report(&CrudcheckConfig::default(), &args(Some("dashboard"))).unwrap();

        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("dashboard_crud"));
        assert!(output.contains("1 scenarios"));
    }

    #[test]
    fn test_list_render_text_empty() {
        let report = build_report(&CrudcheckConfig::default(), &args(Some("no-such"))).unwrap();

        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("text rendering should succeed");
        assert_eq!(String::from_utf8(buffer).unwrap().trim(), "No scenarios match.");
    }

    #[test]
    fn test_list_json_carries_provider_for_key_pairs() {
        let report = build_report(&CrudcheckConfig::default(), &args(Some("keypair_crud["))).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        let entries = json["scenarios"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e["area"] == "cloud"));
        assert!(entries.iter().all(|e| e["provider"].is_string()));
    }
}
