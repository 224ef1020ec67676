//! Capture-to-structured-data pipeline for game-UI screens.
//!
//! An operator acquires an image of a game screen (camera, screen
//! share, file upload, or clipboard paste), picks a crop region, and the
//! cropped frame is turned into a structured order or resource-scan
//! record by an opaque recognition routine running off the host thread.
//! A session state machine drives acquire → crop → submit → verify, with
//! explicit retry on every failure and an optional failure-report
//! upload. Images are held in memory only for the lifetime of one
//! session and are discarded after processing.

pub mod acquire;
pub mod error;
pub mod payload;
pub mod recognize;
pub mod region;
pub mod report;
pub mod session;

pub use error::{AcquireError, RecognitionError, ReportError};
pub use payload::{
    CaptureKind, CapturePayload, OrderRecord, RecognitionResult, ResourceReading, ScanRecord,
    SourceKind,
};
pub use recognize::{
    BitmapEnvironment, Dispatcher, ImageEnvironment, LocalBackend, RecognitionBackend,
    RecognitionRoutine, RemoteBackend, RoutineRegistry,
};
pub use region::{CropRegion, RegionStore, RegionUnit};
pub use report::ReportChannel;
pub use session::{CaptureConsumer, CaptureSession, ConfirmOutcome, SessionError, Stage};
