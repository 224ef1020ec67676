//! Recognition dispatch layer.
//!
//! Two interchangeable strategies behind one contract: a local worker
//! thread running registered routines ([`LocalBackend`]), and a remote
//! service call ([`remote::RemoteBackend`]). Both produce the same
//! result-or-[`RecognitionError`] shape, so the session state machine
//! cannot tell them apart. Single-flight is enforced by the session,
//! not here.

pub mod dispatch;
pub mod environment;
pub mod remote;

pub use dispatch::Dispatcher;
pub use environment::{BitmapEnvironment, Canvas, DecodedImage, ImageEnvironment};
pub use remote::RemoteBackend;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RecognitionError;
use crate::payload::{CaptureKind, RecognitionResult};

/// An opaque recognition routine for one capture kind.
///
/// Maps a cropped image (as a data URL) to a complete structured record,
/// using only the injected [`ImageEnvironment`] for pixel access.
pub type RecognitionRoutine =
    Arc<dyn Fn(&dyn ImageEnvironment, &str) -> anyhow::Result<RecognitionResult> + Send + Sync>;

/// Registered routines, one per capture kind.
#[derive(Default)]
pub struct RoutineRegistry {
    routines: HashMap<CaptureKind, RecognitionRoutine>,
}

impl RoutineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: CaptureKind, routine: RecognitionRoutine) {
        self.routines.insert(kind, routine);
    }

    pub fn get(&self, kind: CaptureKind) -> Option<&RecognitionRoutine> {
        self.routines.get(&kind)
    }
}

/// One recognition strategy: image in, structured record or error out.
pub trait RecognitionBackend: Send {
    fn recognize(
        &self,
        data_url: &str,
        kind: CaptureKind,
    ) -> Result<RecognitionResult, RecognitionError>;
}

/// In-process strategy: runs the registered routine for the kind on the
/// dispatcher's worker thread, with bitmap capabilities injected.
pub struct LocalBackend {
    registry: RoutineRegistry,
    environment: Box<dyn ImageEnvironment>,
}

impl LocalBackend {
    pub fn new(registry: RoutineRegistry, environment: Box<dyn ImageEnvironment>) -> Self {
        Self {
            registry,
            environment,
        }
    }

    /// Local backend with the production bitmap environment.
    pub fn with_bitmaps(registry: RoutineRegistry) -> Self {
        Self::new(registry, Box::new(BitmapEnvironment))
    }
}

impl RecognitionBackend for LocalBackend {
    fn recognize(
        &self,
        data_url: &str,
        kind: CaptureKind,
    ) -> Result<RecognitionResult, RecognitionError> {
        let routine = self.registry.get(kind).ok_or_else(|| {
            RecognitionError::new(format!("no routine registered for {}", kind.storage_key()))
        })?;
        routine(self.environment.as_ref(), data_url)
            .map_err(|e| RecognitionError::new(e.to_string()))
    }
}
