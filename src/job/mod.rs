//! Background compression jobs
//!
//! A job runs on its own thread and talks back over a channel: any number
//! of [`JobEvent::Progress`] messages followed by exactly one terminal
//! `Finished` or `Failed`.

mod cancel;
mod progress;

pub use cancel::CancelToken;
pub use progress::{
    Progress, ProgressTracker, Stage, IMAGES_DONE_PERCENT, LOADED_PERCENT, METADATA_PERCENT,
    SAVING_PERCENT,
};

use std::any::Any;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::compressor::Compressor;
use crate::config::Settings;
use crate::error::CompressError;
use crate::report::CompressionReport;

/// Everything a worker needs to run one job
#[derive(Debug, Clone)]
pub struct CompressionRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub settings: Settings,
}

#[derive(Debug)]
pub enum JobEvent {
    Progress(Progress),
    Finished(CompressionReport),
    Failed(CompressError),
}

impl JobEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobEvent::Progress(_))
    }
}

/// Start a job on a background thread.
pub fn spawn(request: CompressionRequest) -> io::Result<JobHandle> {
    let (sender, events) = mpsc::channel();
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();

    let thread = thread::Builder::new()
        .name("pdf-compress".to_string())
        .spawn(move || {
            let progress_sender = sender.clone();
            let mut tracker = ProgressTracker::new(move |progress| {
                // The receiver may already be gone; the job still runs to the end
                let _ = progress_sender.send(JobEvent::Progress(progress));
            });

            let result = Compressor::new(request.settings).and_then(|compressor| {
                compressor.compress_file(
                    &request.input,
                    &request.output,
                    &mut tracker,
                    &worker_cancel,
                )
            });

            let event = match result {
                Ok(report) => JobEvent::Finished(report),
                Err(err) => {
                    log::debug!("Job for {} failed: {}", request.input.display(), err);
                    JobEvent::Failed(err)
                }
            };
            let _ = sender.send(event);
        })?;

    Ok(JobHandle {
        events,
        cancel,
        thread: Some(thread),
        finished: false,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker thread panicked".to_string()
    }
}

/// Owner side of a running job
#[derive(Debug)]
pub struct JobHandle {
    events: Receiver<JobEvent>,
    cancel: CancelToken,
    thread: Option<JoinHandle<()>>,
    finished: bool,
}

impl JobHandle {
    /// Ask the worker to stop at its next checkpoint
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Raw event stream, for callers that drive their own loop
    pub fn events(&self) -> &Receiver<JobEvent> {
        &self.events
    }

    /// Next event without blocking, if one is ready
    pub fn try_event(&mut self) -> Option<JobEvent> {
        match self.events.try_recv() {
            Ok(event) => {
                self.finished |= event.is_terminal();
                Some(event)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if self.finished {
                    None
                } else {
                    self.finished = true;
                    Some(JobEvent::Failed(self.join_error()))
                }
            }
        }
    }

    /// Block until the job ends, passing progress updates to `on_progress`.
    pub fn wait_with(
        mut self,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<CompressionReport, CompressError> {
        let outcome = loop {
            match self.events.recv() {
                Ok(JobEvent::Progress(progress)) => on_progress(progress),
                Ok(JobEvent::Finished(report)) => break Ok(report),
                Ok(JobEvent::Failed(err)) => break Err(err),
                // Sender dropped without a terminal event: the worker panicked
                Err(_) => break Err(self.join_error()),
            }
        };
        self.finished = true;
        self.join()?;
        outcome
    }

    pub fn wait(self) -> Result<CompressionReport, CompressError> {
        self.wait_with(|_| {})
    }

    fn join(&mut self) -> Result<(), CompressError> {
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|payload| CompressError::Worker(panic_message(payload.as_ref()))),
            None => Ok(()),
        }
    }

    fn join_error(&mut self) -> CompressError {
        match self.join() {
            Err(err) => err,
            Ok(()) => CompressError::Worker("worker exited without a result".to_string()),
        }
    }
}
