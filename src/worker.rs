//! Background driver for one search.
//!
//! A search reports through a stream of [`SolverMessage`]s: `INIT`, a
//! `STATUS` with `done == 0`, batched `STATUS` updates with `done` strictly
//! increasing and below `total`, then exactly one `RESULT` carrying
//! `done == total`. Sends are fire-and-forget; a receiver that went away
//! does not stop the search.

use crate::catalogue::{Catalogue, Semester};
use crate::data::{ScheduleOption, SolveRequest};
use crate::error::SolveError;
use crate::progress::ProgressReporter;
use crate::selection::SelectionPlan;
use crate::solver::{ScheduleSolver, Score};
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

/// Terminal payload of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    /// Every minimal-score schedule; empty when nothing fits.
    pub data: Vec<ScheduleOption>,
    pub score: Option<Score>,
    pub total: u64,
    pub done: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverMessage {
    Init,
    Status { done: u64, total: u64 },
    Result(SearchOutcome),
}

impl SolverMessage {
    /// Short name, used as the SSE event name.
    pub fn kind(&self) -> &'static str {
        match self {
            SolverMessage::Init => "init",
            SolverMessage::Status { .. } => "status",
            SolverMessage::Result(_) => "result",
        }
    }
}

/// Runs a search on the current thread, emitting the full message stream.
///
/// Errors (unknown course, invalid blocks) are returned after `INIT` and
/// before any `STATUS`.
pub fn run_search<S>(
    semester: &Semester,
    request: &SolveRequest,
    report_interval: u64,
    mut send: S,
) -> Result<SearchOutcome, SolveError>
where
    S: FnMut(SolverMessage),
{
    send(SolverMessage::Init);

    let plan = SelectionPlan::build(semester, request)?;
    let solver = ScheduleSolver::new(plan.candidates()?)?;
    let total = plan.total();
    debug_assert_eq!(total, solver.total());

    send(SolverMessage::Status { done: 0, total });
    let best = {
        // The final report travels with RESULT.
        let mut reporter = ProgressReporter::new(report_interval, |done| {
            if done < total {
                send(SolverMessage::Status { done, total });
            }
        });
        solver.solve(&mut reporter)
    };

    let outcome = SearchOutcome {
        data: plan.resolve_all(&best),
        score: best.score,
        total,
        done: total,
    };
    send(SolverMessage::Result(outcome.clone()));
    Ok(outcome)
}

/// A search running on tokio's blocking pool.
pub struct SearchHandle {
    pub messages: UnboundedReceiver<SolverMessage>,
    pub task: JoinHandle<Result<SearchOutcome, SolveError>>,
}

impl SearchHandle {
    /// Waits for the terminal outcome, ignoring intermediate messages.
    pub async fn outcome(self) -> Result<SearchOutcome, SolveError> {
        drop(self.messages);
        self.task
            .await
            .map_err(|e| SolveError::Worker(e.to_string()))?
    }
}

/// Starts a search in the background. The search cannot be cancelled; drop
/// the handle to discard its output.
pub fn spawn_search(
    catalogue: Arc<Catalogue>,
    request: SolveRequest,
    report_interval: u64,
) -> SearchHandle {
    let (tx, messages) = mpsc::unbounded_channel();

    let task = tokio::task::spawn_blocking(move || {
        let semester = catalogue
            .semester(&request.semester)
            .ok_or_else(|| SolveError::UnknownSemester(request.semester.clone()))?;
        info!(
            "Search requested for {} courses in {}",
            request.preferences.len(),
            semester.id()
        );

        run_search(semester, &request, report_interval, |message| {
            if tx.send(message).is_err() {
                debug!("Search receiver dropped; continuing without reports");
            }
        })
    });

    SearchHandle { messages, task }
}
