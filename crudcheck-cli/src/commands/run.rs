//! `crudcheck run` command handler

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crudcheck_appliance::SimulatedAppliance;
use crudcheck_core::config::CrudcheckConfig;
use crudcheck_core::manager::EntityManager;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};
use crate::scenarios::{self, ScenarioOutcome};

/// Execute the `run` command.
///
/// Every run gets a fresh simulated appliance built from `[appliance]`.
///
/// # Errors
///
/// Returns `CliError::ScenariosFailed` after rendering when any scenario failed.
pub async fn execute(
    args: RunArgs,
    config: &CrudcheckConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let report = run_suite(&args, config).await?;
    writer.render(&report)?;

    if report.failed > 0 {
        return Err(CliError::ScenariosFailed {
            failed: report.failed,
            total: report.outcomes.len(),
        });
    }
    Ok(())
}

/// Build the appliance, run the selected scenarios and collect the report.
pub async fn run_suite(args: &RunArgs, config: &CrudcheckConfig) -> Result<RunReport, CliError> {
    let scenarios = scenarios::registry(config, &args.selection)?;
    let appliance = SimulatedAppliance::from_config(&config.appliance)?;
    let manager = EntityManager::new(Arc::new(appliance), config.session.clone());
    manager.ping().await?;

    info!(scenarios = scenarios.len(), fail_fast = args.fail_fast, "running scenario suite");
    let outcomes = scenarios::run_all(&manager, &scenarios, args.fail_fast).await;
    let remote_calls = manager.client().call_log().await.records().len();

    let passed = outcomes.iter().filter(|o| o.passed).count();
    let failed = outcomes.len() - passed;
    info!(passed, failed, remote_calls, "scenario suite finished");

    Ok(RunReport {
        passed,
        failed,
        skipped: scenarios.len() - outcomes.len(),
        remote_calls,
        outcomes,
    })
}

/// Result of one `run`.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub passed: usize,
    pub failed: usize,
    /// Not run because of `--fail-fast`.
    pub skipped: usize,
    pub remote_calls: usize,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        for outcome in &self.outcomes {
            let status = if outcome.passed {
                "PASS".green().bold()
            } else {
                "FAIL".red().bold()
            };
            writeln!(w, "{status} {} ({} ms)", outcome.id, outcome.elapsed_ms)?;
            if let Some(ref error) = outcome.error {
                writeln!(w, "     {}", error.red())?;
            }
        }

        writeln!(w)?;
        let summary = format!(
            "{} passed, {} failed, {} skipped",
            self.passed, self.failed, self.skipped
        );
        if self.failed == 0 {
            writeln!(w, "{}", summary.green())?;
        } else {
            writeln!(w, "{}", summary.red())?;
        }
        writeln!(w, "{} remote calls", self.remote_calls)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &str, error: Option<&str>) -> ScenarioOutcome {
        ScenarioOutcome {
            id: id.to_owned(),
            area: "cloud",
            passed: error.is_none(),
            elapsed_ms: 3,
            error: error.map(str::to_owned),
        }
    }

    #[test]
    fn test_run_report_render_text_shows_failures() {
        let report = RunReport {
            passed: 1,
            failed: 1,
            skipped: 0,
            remote_calls: 12,
            outcomes: vec![
                outcome("keypair_crud[ec2-east]", None),
                outcome("keypair_crud[rhos-01]", Some("expected Key Pair \"x\" to not exist")),
            ],
        };

        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("text rendering should succeed");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("PASS"));
        assert!(output.contains("FAIL"));
        assert!(output.contains("to not exist"));
        assert!(output.contains("1 passed, 1 failed, 0 skipped"));
        assert!(output.contains("12 remote calls"));
    }

    #[test]
    fn test_run_report_json_omits_error_for_passing_scenarios() {
        let report = RunReport {
            passed: 1,
            failed: 0,
            skipped: 0,
            remote_calls: 4,
            outcomes: vec![outcome("dashboard_crud", None)],
        };

        let json = serde_json::to_value(&report).expect("JSON serialization should succeed");
        assert_eq!(json["passed"], 1);
        assert!(json["outcomes"][0].get("error").is_none());
        assert_eq!(json["outcomes"][0]["id"], "dashboard_crud");
    }
}
