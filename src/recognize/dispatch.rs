//! Recognition dispatcher thread.
//!
//! A dedicated worker thread receives requests over an mpsc channel and
//! posts back exactly one response per request. Requests carry a
//! monotonically increasing session token; the host applies only the
//! response matching its current token, so an abandoned request cannot
//! mutate a session that has moved on. There is no pre-emption: the
//! worker finishes whatever it started and the stale response is dropped.

use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use crate::error::RecognitionError;
use crate::payload::{CaptureKind, RecognitionResult};
use crate::recognize::RecognitionBackend;

/// One recognition request, tagged with its session token.
struct RecognitionRequest {
    token: u64,
    data_url: String,
    kind: CaptureKind,
}

/// The worker's single response to a request.
struct RecognitionResponse {
    token: u64,
    outcome: Result<RecognitionResult, RecognitionError>,
}

/// Host-side handle to the recognition worker thread.
pub struct Dispatcher {
    sender: Option<Sender<RecognitionRequest>>,
    responses: Receiver<RecognitionResponse>,
    worker: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawns the worker thread around a recognition backend.
    pub fn spawn(backend: Box<dyn RecognitionBackend>) -> Self {
        let (request_tx, request_rx) = channel();
        let (response_tx, response_rx) = channel();
        let worker = thread::spawn(move || run_worker(request_rx, response_tx, backend));
        Self {
            sender: Some(request_tx),
            responses: response_rx,
            worker: Some(worker),
        }
    }

    /// Queues a recognition request under the given token.
    pub fn submit(
        &self,
        token: u64,
        data_url: String,
        kind: CaptureKind,
    ) -> Result<(), RecognitionError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| RecognitionError::new("recognition worker is shut down"))?;
        sender
            .send(RecognitionRequest {
                token,
                data_url,
                kind,
            })
            .map_err(|_| RecognitionError::new("recognition worker exited"))
    }

    /// Non-blocking poll for the response matching `current_token`.
    ///
    /// Responses for superseded tokens are discarded here; they never
    /// reach the caller.
    pub fn poll(
        &self,
        current_token: u64,
    ) -> Option<Result<RecognitionResult, RecognitionError>> {
        loop {
            match self.responses.try_recv() {
                Ok(response) if response.token == current_token => return Some(response.outcome),
                Ok(response) => {
                    debug!(
                        stale = response.token,
                        current = current_token,
                        "dropping stale recognition response"
                    );
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    return Some(Err(RecognitionError::new("recognition worker exited")));
                }
            }
        }
    }

    /// Blocks until the response for `current_token` arrives.
    ///
    /// For hosts without an event loop; stale responses are discarded
    /// the same way as in `poll`.
    pub fn wait(&self, current_token: u64) -> Result<RecognitionResult, RecognitionError> {
        loop {
            match self.responses.recv() {
                Ok(response) if response.token == current_token => return response.outcome,
                Ok(response) => {
                    debug!(
                        stale = response.token,
                        current = current_token,
                        "dropping stale recognition response"
                    );
                }
                Err(_) => return Err(RecognitionError::new("recognition worker exited")),
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop; join so an
        // in-flight computation finishes before the handle disappears.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Worker loop: one response per request, exits when the channel closes.
fn run_worker(
    requests: Receiver<RecognitionRequest>,
    responses: Sender<RecognitionResponse>,
    backend: Box<dyn RecognitionBackend>,
) {
    debug!("recognition worker started");
    while let Ok(request) = requests.recv() {
        let outcome = backend.recognize(&request.data_url, request.kind);
        if let Err(e) = &outcome {
            warn!(token = request.token, error = %e, "recognition failed");
        }
        if responses
            .send(RecognitionResponse {
                token: request.token,
                outcome,
            })
            .is_err()
        {
            // Host dropped its receiver; nothing left to report to.
            break;
        }
    }
    debug!("recognition worker exiting");
}
