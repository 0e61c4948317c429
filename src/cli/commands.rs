use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::info;

use crate::cli::config::AppConfig;
use crate::device::bridge::DeviceBridge;
use crate::device::identity::{SharedIdentification, spawn_identity_lookups};
use crate::device::surface::{DisplaySurface, StatusSource};
use crate::form::resolver::eligible_fields;
use crate::form::schema::FormDefinition;
use crate::form::session::SessionState;
use crate::router::router::EventRouter;
use crate::serve;
use crate::submit::assembler::Submitter;
use crate::trace::logger::TraceLogger;
use crate::transport::http::HttpTransport;
use crate::ui::renderer::{RenderMode, render};

// ============================================================================
// run subcommand
// ============================================================================

/// Connect to the device and route its events until the bridge closes.
pub async fn cmd_run(
    config: &AppConfig,
    service_url: Option<&str>,
    trace_path: Option<&str>,
) -> anyhow::Result<()> {
    let form = config.form_definition().context("invalid form schema")?;

    let mut settings = config.submission_settings();
    if let Some(url) = service_url {
        settings.service_url = url.to_string();
    }
    if settings.service_url.trim().is_empty() {
        bail!("submission.service_url is not set (config file or --service-url)");
    }

    let (bridge, events) = DeviceBridge::launch(&config.bridge, &form.panel_id)
        .await
        .context("could not start the device bridge")?;
    let bridge = Arc::new(bridge);
    let display: Arc<dyn DisplaySurface> = bridge.clone();
    let status: Arc<dyn StatusSource> = bridge;

    let identification = SharedIdentification::new();
    spawn_identity_lookups(Arc::clone(&status), &identification);

    let submitter = Arc::new(Submitter::new(
        Arc::clone(&display),
        status,
        Arc::new(HttpTransport::new()),
        identification,
        settings,
    ));

    let trace_path = trace_path.or(config.trace_path.as_deref());
    let tracer = TraceLogger::from_path(trace_path)
        .with_context(|| format!("could not open trace file '{}'", trace_path.unwrap_or_default()))?;
    let mut router = EventRouter::new(form, display, submitter, tracer);

    info!(panel = %router.form().panel_id, "serving panel");
    serve(&mut router, events).await;
    Ok(())
}

// ============================================================================
// preview subcommand
// ============================================================================

/// Render the panel XML for `mode` with the given values filled in.
pub fn cmd_preview(
    config: &AppConfig,
    mode: &str,
    values: &[(String, String)],
) -> anyhow::Result<String> {
    let form = config.form_definition().context("invalid form schema")?;
    let session = preview_session(&form, values)?;

    let mode = match mode {
        "start" => RenderMode::Start,
        "form" => RenderMode::Form,
        other => bail!("unknown preview mode '{}' (expected start or form)", other),
    };

    let output = render(&form, &session, mode);
    let mut out = output.document.to_xml();
    for activation in &output.activations {
        out.push_str(&format!(
            "<!-- SetValue {} = {} -->\n",
            activation.widget_id, activation.value
        ));
    }
    Ok(out)
}

fn preview_session(
    form: &FormDefinition,
    values: &[(String, String)],
) -> anyhow::Result<SessionState> {
    let mut session = SessionState::start(&form.schema);
    for (key, value) in values {
        let Some(field) = form.schema.get(key) else {
            bail!("form has no field '{}'", key);
        };
        if !session.record(field, value) {
            bail!("field '{}' is not modifiable", key);
        }
    }
    Ok(session)
}

// ============================================================================
// check subcommand
// ============================================================================

/// Validate the schema and describe it: field order, dependencies, and what
/// shows up on a fresh session.
pub fn cmd_check(config: &AppConfig) -> anyhow::Result<String> {
    let form = config.form_definition().context("invalid form schema")?;
    let session = SessionState::start(&form.schema);

    let mut out = format!(
        "Form '{}' (panel '{}'): {} fields, {} categories\n",
        form.name,
        form.panel_id,
        form.schema.len(),
        form.start.options.len()
    );

    for field in form.schema.fields() {
        let requires = if field.requires.is_empty() {
            "-".to_string()
        } else {
            field.requires.join(", ")
        };
        let action = field
            .action
            .map(|a| format!("{:?}", a))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {:<12} requires [{}] action {}{}\n",
            field.key,
            requires,
            action,
            if field.visible { "" } else { " (hidden)" }
        ));
    }

    let initial: Vec<&str> = eligible_fields(&form.schema, &session)
        .iter()
        .map(|f| f.key.as_str())
        .collect();
    out.push_str(&format!("Shown on a fresh session: {}\n", initial.join(", ")));

    Ok(out)
}
