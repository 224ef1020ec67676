//! Capture session state machine.
//!
//! One session exists per open capture dialog: created on open, torn
//! down on close. The stage is derived from which payload fields are
//! populated, so stage and data cannot fall out of sync; there is no
//! independent stage flag. The session sequences acquire → crop →
//! submit → verify, with explicit retry on failure.

use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::acquire::camera::{CameraSource, DeviceInventory, VideoFeed};
use crate::acquire::paste::{ClipboardItem, PasteWatcher};
use crate::acquire::screen::{LiveStream, ScreenShare};
use crate::error::{AcquireError, RecognitionError, ReportError};
use crate::payload::{CapturePayload, CaptureKind, RecognitionResult, image_from_data_url, png_data_url};
use crate::recognize::RecognitionBackend;
use crate::recognize::dispatch::Dispatcher;
use crate::region::{CropRegion, RegionStore, crop_to_region};
use crate::report::ReportChannel;

/// The stages a capture session moves through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Waiting for any acquisition source to produce a payload.
    Acquire,
    /// A region editor is shown over the raw image or live preview.
    Crop,
    /// A recognition call is outstanding.
    Submitting,
    /// The result is shown for operator confirmation.
    Verify,
    /// Recognition failed; an explicit retry is required.
    Error,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Acquire => write!(f, "acquire"),
            Stage::Crop => write!(f, "crop"),
            Stage::Submitting => write!(f, "submitting"),
            Stage::Verify => write!(f, "verify"),
            Stage::Error => write!(f, "error"),
        }
    }
}

/// A session operation was attempted in the wrong stage or failed below.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("operation not valid in {0} stage")]
    WrongStage(Stage),
    #[error(transparent)]
    Acquire(#[from] AcquireError),
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
    #[error("region store: {0}")]
    Store(#[from] std::io::Error),
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Receives the confirmed result of a capture.
pub trait CaptureConsumer {
    /// True when the consumer already holds data for this slot, in which
    /// case an overwrite confirmation is interposed before the handoff.
    fn has_existing(&self, kind: CaptureKind) -> bool;

    /// Receives the confirmed result. Invoked exactly once per capture.
    fn on_capture(&mut self, result: RecognitionResult);
}

/// Outcome of a `confirm` call.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The result was handed to the consumer and the session closed.
    Delivered,
    /// The consumer already holds data for this slot; the operator must
    /// confirm the overwrite.
    NeedsOverwrite,
}

/// The single mutable aggregate of one open capture dialog.
pub struct CaptureSession {
    kind: CaptureKind,
    regions: RegionStore,
    dispatcher: Dispatcher,
    camera: Result<CameraSource, AcquireError>,
    screen_share: ScreenShare,
    paste_watcher: PasteWatcher,
    raw_image: Option<CapturePayload>,
    pending_region: CropRegion,
    submitted_snapshot: Option<String>,
    in_flight: Option<u64>,
    result: Option<RecognitionResult>,
    error: Option<RecognitionError>,
    next_token: u64,
}

impl CaptureSession {
    /// Opens a session: enumerates camera devices once, registers the
    /// paste watcher, and spawns the recognition worker.
    pub fn open(
        kind: CaptureKind,
        regions: RegionStore,
        backend: Box<dyn RecognitionBackend>,
        inventory: &dyn DeviceInventory,
    ) -> Self {
        let mut paste_watcher = PasteWatcher::new();
        paste_watcher.register();
        let pending_region = regions.region(kind);
        Self {
            kind,
            regions,
            dispatcher: Dispatcher::spawn(backend),
            camera: CameraSource::open(inventory),
            screen_share: ScreenShare::new(),
            paste_watcher,
            raw_image: None,
            pending_region,
            submitted_snapshot: None,
            in_flight: None,
            result: None,
            error: None,
            next_token: 1,
        }
    }

    /// Current stage, derived purely from which fields are populated.
    pub fn stage(&self) -> Stage {
        if self.error.is_some() {
            Stage::Error
        } else if self.result.is_some() {
            Stage::Verify
        } else if self.in_flight.is_some() {
            Stage::Submitting
        } else if self.raw_image.is_some() || self.screen_share.is_active() {
            Stage::Crop
        } else {
            Stage::Acquire
        }
    }

    pub fn kind(&self) -> CaptureKind {
        self.kind
    }

    /// Region the crop editor is currently seeded with.
    pub fn pending_region(&self) -> CropRegion {
        self.pending_region
    }

    /// Camera control state: the source, or why it is disabled.
    ///
    /// An unavailable camera leaves the other sources usable.
    pub fn camera(&self) -> Result<&CameraSource, &AcquireError> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Result<&mut CameraSource, &AcquireError> {
        self.camera.as_mut().map_err(|e| &*e)
    }

    pub fn screen_share_active(&self) -> bool {
        self.screen_share.is_active()
    }

    pub fn raw_image(&self) -> Option<&CapturePayload> {
        self.raw_image.as_ref()
    }

    pub fn result(&self) -> Option<&RecognitionResult> {
        self.result.as_ref()
    }

    /// Operator-visible message of the failed recognition, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    pub fn submitted_snapshot(&self) -> Option<&str> {
        self.submitted_snapshot.as_deref()
    }

    /// Accepts a payload from any source, entering the crop stage.
    ///
    /// Re-acquiring replaces the previous payload and re-seeds the crop
    /// editor from the stored region for this kind rather than keeping
    /// the in-progress crop.
    pub fn accept_payload(&mut self, payload: CapturePayload) -> Result<(), SessionError> {
        match self.stage() {
            Stage::Acquire | Stage::Crop => {}
            stage => return Err(SessionError::WrongStage(stage)),
        }
        debug!(source = ?payload.source, "payload accepted");
        self.raw_image = Some(payload);
        self.pending_region = self.regions.region(self.kind);
        Ok(())
    }

    /// Takes a photo from the active camera and accepts it.
    pub fn take_photo(&mut self, feed: &dyn VideoFeed) -> Result<(), SessionError> {
        let payload = match self.camera.as_ref() {
            Ok(camera) => camera.take_photo(feed)?,
            Err(err) => return Err(err.clone().into()),
        };
        self.accept_payload(payload)
    }

    /// Feeds a paste event through the watcher. Returns whether an image
    /// item was accepted; non-image pastes are ignored without error.
    pub fn handle_paste(&mut self, items: &[ClipboardItem]) -> Result<bool, SessionError> {
        let Some(payload) = self.paste_watcher.handle_paste(items) else {
            return Ok(false);
        };
        self.accept_payload(payload)?;
        Ok(true)
    }

    /// Adopts a screen-share stream; the live preview makes the crop
    /// editor available without a rasterized payload.
    pub fn start_screen_share(&mut self, stream: Box<dyn LiveStream>) -> Result<(), SessionError> {
        match self.stage() {
            Stage::Acquire | Stage::Crop => {}
            stage => return Err(SessionError::WrongStage(stage)),
        }
        self.screen_share.start(stream);
        self.pending_region = self.regions.region(self.kind);
        Ok(())
    }

    /// Toggles the screen share off. No-op when inactive.
    pub fn stop_screen_share(&mut self) {
        self.screen_share.stop();
    }

    /// Discards the raw image and live preview, returning to acquire.
    pub fn discard(&mut self) -> Result<(), SessionError> {
        if self.stage() != Stage::Crop {
            return Err(SessionError::WrongStage(self.stage()));
        }
        self.raw_image = None;
        self.screen_share.stop();
        Ok(())
    }

    /// Persists the region, snapshots the current frame (rasterizing a
    /// live screen share now), and dispatches recognition.
    ///
    /// Rejected outside the crop stage, in particular while a prior
    /// call is still outstanding, so recognition calls never overlap.
    pub fn submit(&mut self, region: CropRegion) -> Result<(), SessionError> {
        if self.stage() != Stage::Crop {
            return Err(SessionError::WrongStage(self.stage()));
        }

        self.regions.set_region(self.kind, region)?;
        self.pending_region = region;

        let data_url = match &self.raw_image {
            Some(payload) => payload.data_url.clone(),
            None => self.screen_share.snapshot()?.data_url,
        };
        let frame = image_from_data_url(&data_url)?;
        let cropped = crop_to_region(&frame, &region);
        let cropped_url = png_data_url(&cropped)?;

        let token = self.next_token;
        self.next_token += 1;
        self.dispatcher.submit(token, cropped_url.clone(), self.kind)?;
        self.submitted_snapshot = Some(cropped_url);
        self.in_flight = Some(token);
        debug!(token, kind = ?self.kind, "recognition dispatched");
        Ok(())
    }

    /// Pumps the dispatcher once and returns the resulting stage.
    ///
    /// Responses whose token no longer matches the outstanding request
    /// are dropped by the dispatcher and never mutate the session.
    pub fn poll(&mut self) -> Stage {
        if let Some(token) = self.in_flight {
            if let Some(outcome) = self.dispatcher.poll(token) {
                self.apply_outcome(outcome);
            }
        }
        self.stage()
    }

    /// Blocks until the outstanding recognition call resolves.
    pub fn wait_for_outcome(&mut self) -> Result<Stage, SessionError> {
        let token = match self.in_flight {
            Some(token) => token,
            None => return Err(SessionError::WrongStage(self.stage())),
        };
        let outcome = self.dispatcher.wait(token);
        self.apply_outcome(outcome);
        Ok(self.stage())
    }

    fn apply_outcome(&mut self, outcome: Result<RecognitionResult, RecognitionError>) {
        self.in_flight = None;
        // The raw image is released on both edges; only the snapshot is
        // kept on failure, for the report channel.
        self.raw_image = None;
        match outcome {
            Ok(result) => {
                self.submitted_snapshot = None;
                self.error = None;
                self.result = Some(result);
            }
            Err(e) => {
                self.result = None;
                self.error = Some(e);
            }
        }
    }

    /// Abandons the current result or error, returning to acquire with
    /// no residual payloads.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        match self.stage() {
            Stage::Verify | Stage::Error => {}
            stage => return Err(SessionError::WrongStage(stage)),
        }
        self.result = None;
        self.error = None;
        self.raw_image = None;
        self.submitted_snapshot = None;
        self.screen_share.stop();
        Ok(())
    }

    /// Hands the verified result to the consumer and closes the session,
    /// unless the consumer already holds data for this slot.
    pub fn confirm(
        &mut self,
        consumer: &mut dyn CaptureConsumer,
    ) -> Result<ConfirmOutcome, SessionError> {
        if self.stage() != Stage::Verify {
            return Err(SessionError::WrongStage(self.stage()));
        }
        if consumer.has_existing(self.kind) {
            return Ok(ConfirmOutcome::NeedsOverwrite);
        }
        self.deliver(consumer)?;
        Ok(ConfirmOutcome::Delivered)
    }

    /// Completes a confirm that was held for overwrite approval.
    pub fn confirm_overwrite(
        &mut self,
        consumer: &mut dyn CaptureConsumer,
    ) -> Result<(), SessionError> {
        if self.stage() != Stage::Verify {
            return Err(SessionError::WrongStage(self.stage()));
        }
        self.deliver(consumer)
    }

    fn deliver(&mut self, consumer: &mut dyn CaptureConsumer) -> Result<(), SessionError> {
        let result = match self.result.take() {
            Some(result) => result,
            None => return Err(SessionError::WrongStage(self.stage())),
        };
        consumer.on_capture(result);
        self.close();
        Ok(())
    }

    /// Uploads the failed capture through the report channel.
    ///
    /// Reachable only from the error stage and never advances the
    /// pipeline; a failed upload is a notification concern.
    pub fn report_failure(
        &self,
        channel: &ReportChannel,
        note: &str,
    ) -> Result<(), SessionError> {
        if self.stage() != Stage::Error {
            return Err(SessionError::WrongStage(self.stage()));
        }
        let snapshot = match self.submitted_snapshot.as_deref() {
            Some(snapshot) => snapshot,
            None => return Err(SessionError::WrongStage(Stage::Error)),
        };
        channel.report(snapshot, self.kind, note)?;
        Ok(())
    }

    /// Tears down live resources and drops all payloads. Idempotent and
    /// safe at any stage; any in-flight response becomes stale.
    pub fn close(&mut self) {
        self.screen_share.stop();
        self.paste_watcher.detach();
        self.in_flight = None;
        self.raw_image = None;
        self.submitted_snapshot = None;
        self.result = None;
        self.error = None;
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}
