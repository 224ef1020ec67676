//! Clipboard-paste acquisition.
//!
//! A paste watcher is registered once per capture dialog and detached on
//! teardown. Paste events arrive as a list of typed clipboard items; the
//! first image item becomes the payload and anything else is ignored
//! without error.

use tracing::debug;

use crate::payload::{CapturePayload, SourceKind, encode_data_url};

/// One typed item from a paste event.
#[derive(Clone, Debug)]
pub struct ClipboardItem {
    /// MIME type reported by the clipboard, e.g. `image/png`.
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ClipboardItem {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

/// The dialog-scoped paste listener.
///
/// Register/detach are idempotent; an unregistered watcher ignores every
/// paste, so a stale platform callback after teardown is harmless.
#[derive(Default)]
pub struct PasteWatcher {
    registered: bool,
}

impl PasteWatcher {
    pub fn new() -> Self {
        Self { registered: false }
    }

    /// Registers the process-wide paste listener for this dialog.
    pub fn register(&mut self) {
        if !self.registered {
            self.registered = true;
            debug!("paste watcher registered");
        }
    }

    /// Detaches the listener. Safe to call repeatedly.
    pub fn detach(&mut self) {
        if self.registered {
            self.registered = false;
            debug!("paste watcher detached");
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Extracts the first image item from a paste event.
    ///
    /// Returns `None` for non-image pastes and for events arriving while
    /// the watcher is detached.
    pub fn handle_paste(&self, items: &[ClipboardItem]) -> Option<CapturePayload> {
        if !self.registered {
            return None;
        }
        let item = items.iter().find(|i| i.is_image())?;
        Some(CapturePayload {
            data_url: encode_data_url(&item.bytes, &item.mime),
            source: SourceKind::Paste,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_item() -> ClipboardItem {
        ClipboardItem::new("image/png", vec![0x89, 0x50, 0x4e, 0x47])
    }

    #[test]
    fn test_extracts_first_image_item() {
        let mut watcher = PasteWatcher::new();
        watcher.register();
        let items = [
            ClipboardItem::new("text/plain", b"hello".to_vec()),
            png_item(),
            ClipboardItem::new("image/jpeg", vec![0xff, 0xd8]),
        ];
        let payload = watcher.handle_paste(&items).unwrap();
        assert_eq!(payload.source, SourceKind::Paste);
        assert!(payload.data_url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_non_image_paste_is_ignored() {
        let mut watcher = PasteWatcher::new();
        watcher.register();
        let items = [ClipboardItem::new("text/html", b"<b>hi</b>".to_vec())];
        assert!(watcher.handle_paste(&items).is_none());
    }

    #[test]
    fn test_detached_watcher_ignores_pastes() {
        let watcher = PasteWatcher::new();
        assert!(watcher.handle_paste(&[png_item()]).is_none());
    }

    #[test]
    fn test_register_and_detach_are_idempotent() {
        let mut watcher = PasteWatcher::new();
        watcher.register();
        watcher.register();
        assert!(watcher.is_registered());
        watcher.detach();
        watcher.detach();
        assert!(!watcher.is_registered());
    }
}
