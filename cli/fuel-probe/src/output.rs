//! Output formatting for CLI commands.

use colored::Colorize;
use fuel_config::{ConfigurationState, ResolutionReport, StepOutcome};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

/// Everything a `resolve` run produced.
pub struct Resolution<'a> {
    pub nailgun_url: String,
    pub defaults_path: Option<String>,
    pub state: &'a ConfigurationState,
    pub report: &'a ResolutionReport,
    pub proxy: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
struct StepRow {
    #[tabled(rename = "STEP")]
    step: &'static str,
    #[tabled(rename = "OUTCOME")]
    outcome: &'static str,
    #[tabled(rename = "DETAIL")]
    detail: String,
}

#[derive(Debug, Serialize, Tabled)]
struct FieldRow {
    #[tabled(rename = "FIELD")]
    field: &'static str,
    #[tabled(rename = "VALUE")]
    value: String,
}

#[derive(Serialize)]
struct ResolutionJson<'a> {
    nailgun_url: &'a str,
    defaults_path: Option<&'a str>,
    complete: bool,
    steps: Vec<StepRow>,
    proxy: Option<&'a str>,
    config: &'a ConfigurationState,
}

#[derive(Serialize)]
struct DefaultsJson<'a> {
    defaults_path: Option<&'a str>,
    proxy: Option<&'a str>,
    config: &'a ConfigurationState,
}

fn step_rows(report: &ResolutionReport) -> Vec<StepRow> {
    report
        .steps()
        .iter()
        .map(|record| {
            let (outcome, detail) = match &record.outcome {
                StepOutcome::Completed => ("completed", String::new()),
                StepOutcome::Failed(err) => ("failed", err.to_string()),
                StepOutcome::Skipped => ("skipped", String::new()),
            };
            StepRow {
                step: record.step.as_str(),
                outcome,
                detail,
            }
        })
        .collect()
}

/// Fields the harness consumes from the resolved configuration.
fn field_rows(state: &ConfigurationState, proxy: Option<&str>) -> Vec<FieldRow> {
    vec![
        FieldRow {
            field: "mode",
            value: state.mode.to_string(),
        },
        FieldRow {
            field: "identity.url",
            value: state.identity.url.clone(),
        },
        FieldRow {
            field: "identity.uri",
            value: state.identity.uri.clone(),
        },
        FieldRow {
            field: "identity.admin_username",
            value: state.identity.admin_username.clone(),
        },
        FieldRow {
            field: "identity.admin_tenant_name",
            value: state.identity.admin_tenant_name.clone(),
        },
        FieldRow {
            field: "compute.controller_nodes",
            value: state.compute.controller_nodes.join(", "),
        },
        FieldRow {
            field: "compute.controller_nodes_name",
            value: state.compute.controller_nodes_name.join(", "),
        },
        FieldRow {
            field: "compute.public_ips",
            value: state.compute.public_ips.join(", "),
        },
        FieldRow {
            field: "http_proxy",
            value: proxy.unwrap_or("-").to_string(),
        },
    ]
}

fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// Print the outcome of a resolution run.
pub fn print_resolution(resolution: &Resolution<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{} {}", "Nailgun:".bold(), resolution.nailgun_url);
            if let Some(path) = &resolution.defaults_path {
                println!("{} {}", "Defaults:".bold(), path);
            }
            println!();
            println!("{}", Table::new(step_rows(resolution.report)));
            println!();
            println!(
                "{}",
                Table::new(field_rows(resolution.state, resolution.proxy.as_deref()))
            );

            if resolution.report.is_complete() {
                println!("\n{} configuration resolved", "Success:".green().bold());
            } else {
                println!(
                    "\n{} {}",
                    "Warning:".yellow().bold(),
                    "resolution incomplete, unresolved fields keep their defaults".dimmed()
                );
            }
        }
        OutputFormat::Json => {
            let json = ResolutionJson {
                nailgun_url: &resolution.nailgun_url,
                defaults_path: resolution.defaults_path.as_deref(),
                complete: resolution.report.is_complete(),
                steps: step_rows(resolution.report),
                proxy: resolution.proxy.as_deref(),
                config: resolution.state,
            };
            println!("{}", format_json(&json));
        }
    }
}

/// Print static defaults.
pub fn print_state(
    state: &ConfigurationState,
    defaults_path: Option<&str>,
    proxy: Option<&str>,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Table => {
            if let Some(path) = defaults_path {
                println!("{} {}", "Defaults:".bold(), path);
            }
            println!("{}", Table::new(field_rows(state, proxy)));
        }
        OutputFormat::Json => {
            println!(
                "{}",
                format_json(&DefaultsJson {
                    defaults_path,
                    proxy,
                    config: state,
                })
            );
        }
    }
}
