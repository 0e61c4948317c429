use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    device::surface::{DisplaySurface, TextInputRequest},
    form::{
        resolver::is_eligible,
        schema::{CATEGORY_KEY, FieldAction, FieldSpec, FormDefinition, StartScreen},
        session::SessionState,
    },
    submit::assembler::{SubmissionOutcome, Submitter},
    trace::{logger::TraceLogger, trace::TraceEvent},
    ui::{
        events::{CLICKED, UiEvent},
        renderer::{RenderMode, RenderOutput, push, render},
    },
};

/// Why an event produced no state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    ForeignPanel(String),
    NotClicked(String),
    UnknownWidget(String),
    OptionOutOfRange(usize),
    NoAction(String),
    NotModifiable(String),
    UnknownField(String),
    InputRejected(String),
}

/// What the router did with one event.
#[derive(Debug)]
pub enum Dispatch {
    Ignored(IgnoreReason),
    /// Own panel opened: fresh session, category screen
    SessionRestarted,
    /// "Change category": fresh session, category screen
    CategoryChangeRequested,
    CategorySelected { category: String },
    PromptOpened { field: String },
    ValueRecorded { field: String },
    /// Panel closed and the report is on its way
    Submitted(JoinHandle<SubmissionOutcome>),
}

impl Dispatch {
    pub fn label(&self) -> String {
        match self {
            Dispatch::Ignored(reason) => format!("ignored:{:?}", reason),
            Dispatch::SessionRestarted => "session_restarted".to_string(),
            Dispatch::CategoryChangeRequested => "category_change_requested".to_string(),
            Dispatch::CategorySelected { category } => format!("category_selected:{}", category),
            Dispatch::PromptOpened { field } => format!("prompt_opened:{}", field),
            Dispatch::ValueRecorded { field } => format!("value_recorded:{}", field),
            Dispatch::Submitted(_) => "submitted".to_string(),
        }
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self, Dispatch::Ignored(_))
    }
}

/// Resolved target of a widget click. Field keys win over `option<i>` ids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickTarget<'a> {
    Field(&'a FieldSpec),
    StartOption(usize),
    Unknown,
}

pub fn resolve_click<'a>(form: &'a FormDefinition, widget_id: &str) -> ClickTarget<'a> {
    if let Some(field) = form.schema.get(widget_id) {
        return ClickTarget::Field(field);
    }
    match StartScreen::parse_option_id(widget_id) {
        Some(index) => ClickTarget::StartOption(index),
        None => ClickTarget::Unknown,
    }
}

/// Hook for per-field input checks. A configured `regex` is carried but not
/// enforced, so every input is accepted.
fn input_accepted(_field: &FieldSpec, _text: &str) -> bool {
    true
}

/// Owns the session and turns UI events into state changes and renders.
pub struct EventRouter {
    form: FormDefinition,
    session: SessionState,
    display: Arc<dyn DisplaySurface>,
    submitter: Arc<Submitter>,
    tracer: TraceLogger,
    step: u64,
    renders: u64,
    last_render: Option<RenderOutput>,
}

impl EventRouter {
    pub fn new(
        form: FormDefinition,
        display: Arc<dyn DisplaySurface>,
        submitter: Arc<Submitter>,
        tracer: TraceLogger,
    ) -> Self {
        let session = SessionState::start(&form.schema);
        Self {
            form,
            session,
            display,
            submitter,
            tracer,
            step: 0,
            renders: 0,
            last_render: None,
        }
    }

    pub fn form(&self) -> &FormDefinition {
        &self.form
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn tracer(&self) -> &TraceLogger {
        &self.tracer
    }

    /// The most recent document pushed to the display.
    pub fn last_render(&self) -> Option<&RenderOutput> {
        self.last_render.as_ref()
    }

    /// Initial panel at process start, before any event arrives.
    pub fn install(&mut self) {
        self.show(RenderMode::Form);
    }

    pub fn handle(&mut self, event: UiEvent) -> Dispatch {
        let trace = TraceEvent::now(self.step, &event);
        self.step += 1;
        let renders_before = self.renders;

        let dispatch = match &event {
            UiEvent::PanelOpened { panel_id } => self.on_panel_opened(panel_id),
            UiEvent::WidgetAction {
                widget_id,
                action_type,
            } => self.on_widget_action(widget_id, action_type),
            UiEvent::TextSubmitted { feedback_id, text } => {
                self.on_text_submitted(feedback_id, text)
            }
        };

        if let Dispatch::Ignored(reason) = &dispatch {
            debug!(?reason, "event ignored");
        }

        let mut trace = trace.with_dispatch(dispatch.label()).with_session(&self.session);
        if self.renders > renders_before {
            if let Some(output) = &self.last_render {
                trace = trace.with_render(output);
            }
        }
        self.tracer.log(&trace);

        dispatch
    }

    fn on_panel_opened(&mut self, panel_id: &str) -> Dispatch {
        if panel_id != self.form.panel_id {
            return Dispatch::Ignored(IgnoreReason::ForeignPanel(panel_id.to_string()));
        }
        info!(panel = %panel_id, "panel opened, starting a new session");
        self.restart();
        Dispatch::SessionRestarted
    }

    fn on_widget_action(&mut self, widget_id: &str, action_type: &str) -> Dispatch {
        if action_type != CLICKED {
            return Dispatch::Ignored(IgnoreReason::NotClicked(action_type.to_string()));
        }
        info!("{} Clicked", widget_id);

        let field = match resolve_click(&self.form, widget_id) {
            ClickTarget::Field(field) => field.clone(),
            ClickTarget::StartOption(index) => return self.select_option(index),
            ClickTarget::Unknown => {
                warn!("No field or option for widget '{}'", widget_id);
                return Dispatch::Ignored(IgnoreReason::UnknownWidget(widget_id.to_string()));
            }
        };

        match field.action {
            Some(FieldAction::OpenTextInput) => self.open_prompt(&field),
            Some(FieldAction::OptionSelect) => {
                self.restart();
                Dispatch::CategoryChangeRequested
            }
            Some(FieldAction::Submit) => self.submit(&field),
            None => Dispatch::Ignored(IgnoreReason::NoAction(field.key.clone())),
        }
    }

    fn on_text_submitted(&mut self, feedback_id: &str, text: &str) -> Dispatch {
        let Some(field) = self.form.schema.get(feedback_id).cloned() else {
            warn!("Text input for unknown field '{}'", feedback_id);
            return Dispatch::Ignored(IgnoreReason::UnknownField(feedback_id.to_string()));
        };

        if !input_accepted(&field, text) {
            return Dispatch::Ignored(IgnoreReason::InputRejected(field.key));
        }

        if !self.session.record(&field, text) {
            warn!("Field '{}' is not modifiable, keeping its default", field.key);
            return Dispatch::Ignored(IgnoreReason::NotModifiable(field.key));
        }

        debug!(field = %field.key, "value recorded");
        self.show(RenderMode::Form);
        Dispatch::ValueRecorded { field: field.key }
    }

    fn select_option(&mut self, index: usize) -> Dispatch {
        let Some(category) = self.form.start.option(index).map(str::to_string) else {
            warn!("Option [{}] does not exist", index);
            return Dispatch::Ignored(IgnoreReason::OptionOutOfRange(index));
        };
        info!("Option [{}] selected, category [{}]", index, category);

        match self.form.schema.get(CATEGORY_KEY).cloned() {
            Some(field) => {
                if !self.session.record(&field, &category) {
                    return Dispatch::Ignored(IgnoreReason::NotModifiable(field.key));
                }
            }
            None => {
                warn!("Schema has no '{}' field to hold the selection", CATEGORY_KEY);
                return Dispatch::Ignored(IgnoreReason::UnknownField(CATEGORY_KEY.to_string()));
            }
        }

        self.show(RenderMode::Form);
        Dispatch::CategorySelected { category }
    }

    fn open_prompt(&mut self, field: &FieldSpec) -> Dispatch {
        if !field.modifiable {
            return Dispatch::Ignored(IgnoreReason::NotModifiable(field.key.clone()));
        }
        info!("Opening Text Input for: {}", field.key);

        let request = TextInputRequest {
            feedback_id: field.key.clone(),
            input_type: field.input_type,
            placeholder: field.placeholder.clone(),
            text: field.prompt_text.clone(),
            title: self.form.name.clone(),
            input_text: self.session.get(&field.key).map(str::to_string),
        };
        if let Err(e) = self.display.prompt_text_input(&request) {
            warn!("Failed to open text input for '{}': {}", field.key, e);
        }
        Dispatch::PromptOpened {
            field: field.key.clone(),
        }
    }

    /// Close the panel and hand a snapshot of the session to the submitter.
    /// The session itself is kept so a failed send can be retried.
    fn submit(&mut self, field: &FieldSpec) -> Dispatch {
        if !is_eligible(&self.form.schema, &self.session, &field.key) {
            // Only rendered widgets can be clicked on a real device.
            debug!(field = %field.key, "submit clicked while not rendered");
        }

        if let Err(e) = self.display.close_panel() {
            warn!("Failed to close panel: {}", e);
        }

        let submitter = Arc::clone(&self.submitter);
        let snapshot = self.session.clone();
        Dispatch::Submitted(tokio::spawn(async move { submitter.submit(snapshot).await }))
    }

    fn restart(&mut self) {
        self.session.reset(&self.form.schema);
        self.show(RenderMode::Start);
    }

    fn show(&mut self, mode: RenderMode) {
        let output = render(&self.form, &self.session, mode);
        debug!(
            mode = ?output.mode,
            rows = output.document.rows.len(),
            keys = ?self.session.keys(),
            "rendering panel"
        );
        push(self.display.as_ref(), &output);
        self.renders += 1;
        self.last_render = Some(output);
    }
}
