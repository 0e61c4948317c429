use tokio::{sync::mpsc::UnboundedReceiver, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    router::router::{Dispatch, EventRouter},
    submit::assembler::SubmissionOutcome,
    ui::events::UiEvent,
};

pub mod cli;
pub mod device;
pub mod form;
pub mod router;
pub mod submit;
pub mod trace;
pub mod transport;
pub mod ui;

/// Install the initial panel and route events in arrival order until the
/// event stream closes. Submissions run in the background; any still in
/// flight when the stream closes are awaited before returning.
pub async fn serve(router: &mut EventRouter, mut events: UnboundedReceiver<UiEvent>) {
    router.install();
    let mut submissions: Vec<JoinHandle<SubmissionOutcome>> = Vec::new();

    while let Some(event) = events.recv().await {
        match router.handle(event) {
            Dispatch::Submitted(handle) => {
                submissions.retain(|h| !h.is_finished());
                debug!(in_flight = submissions.len() + 1, "submission running in background");
                submissions.push(handle);
            }
            dispatch => debug!(dispatch = %dispatch.label(), "event routed"),
        }
    }

    info!("event stream closed");

    submissions.retain(|h| !h.is_finished());
    if !submissions.is_empty() {
        info!(pending = submissions.len(), "waiting for submissions in flight");
    }
    for handle in submissions {
        match handle.await {
            Ok(outcome) => debug!(?outcome, "submission finished after close"),
            Err(e) => warn!("submission task failed: {}", e),
        }
    }
}
