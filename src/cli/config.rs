use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::{
    device::bridge::BridgeConfig,
    form::{
        error::FormError,
        schema::{FieldSpec, FormDefinition, StartScreen, stock_fields},
    },
    submit::assembler::SubmissionSettings,
};

pub const DEFAULT_CONFIG_PATH: &str = "report-issue.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "report-issue-panel",
    version,
    about = "Guided issue reporting panel for meeting room devices"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: report-issue.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to the device bridge and serve the panel
    Run {
        /// Override submission.service_url
        #[arg(long)]
        service_url: Option<String>,

        /// Append a JSONL trace of every routed event to this file
        #[arg(long)]
        trace: Option<String>,
    },

    /// Print the panel XML for a given session state
    Preview {
        /// Screen to render: start or form
        #[arg(long, default_value = "form")]
        mode: String,

        /// Pre-fill a field, e.g. --set category="Request for a technician"
        #[arg(long = "set", value_parser = parse_key_value)]
        values: Vec<(String, String)>,
    },

    /// Validate the form schema and print the field order
    Check,
}

/// Parse `key=value`. The value may itself contain `=`.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `report-issue.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Panel and prompt title
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_panel_id")]
    pub panel_id: String,

    #[serde(default)]
    pub start: StartScreen,

    /// Fields in render order
    #[serde(default = "stock_fields")]
    pub form: Vec<FieldSpec>,

    #[serde(default)]
    pub submission: SubmissionConfig,

    #[serde(default)]
    pub bridge: BridgeConfig,

    pub trace_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            panel_id: default_panel_id(),
            start: StartScreen::default(),
            form: stock_fields(),
            submission: SubmissionConfig::default(),
            bridge: BridgeConfig::default(),
            trace_path: None,
        }
    }
}

impl AppConfig {
    /// Validate the form section into something the engine can run.
    pub fn form_definition(&self) -> Result<FormDefinition, FormError> {
        FormDefinition::new(&self.name, &self.panel_id, self.start.clone(), self.form.clone())
    }

    pub fn submission_settings(&self) -> SubmissionSettings {
        SubmissionSettings {
            service_url: self.submission.service_url.clone(),
            allow_insecure_https: self.submission.allow_insecure_https,
            show_alert: self.submission.show_alert,
            waiting_text: self.submission.waiting_text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    #[serde(default)]
    pub service_url: String,

    /// Accept invalid TLS certificates (testing only)
    #[serde(default = "default_true")]
    pub allow_insecure_https: bool,

    /// Show success and error alerts; one waiting alert is shown either way
    #[serde(default = "default_true")]
    pub show_alert: bool,

    #[serde(default = "default_waiting_text")]
    pub waiting_text: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            service_url: String::new(),
            allow_insecure_https: true,
            show_alert: true,
            waiting_text: default_waiting_text(),
        }
    }
}

// Serde default helpers
fn default_true() -> bool { true }
fn default_name() -> String { "Report Issue".to_string() }
fn default_panel_id() -> String { "feedback".to_string() }
fn default_waiting_text() -> String { "Sending Feedback".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. A missing file yields the defaults; a file
/// that exists but does not parse is an error.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, FormError> {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => parse_config(config_path, &content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(FormError::ConfigRead {
            path: config_path.to_string(),
            source: e,
        }),
    }
}

pub fn parse_config(path: &str, content: &str) -> Result<AppConfig, FormError> {
    serde_yaml::from_str(content).map_err(|e| FormError::ConfigParse {
        path: path.to_string(),
        source: e,
    })
}
