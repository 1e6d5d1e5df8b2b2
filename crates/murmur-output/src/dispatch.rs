//! Delivery of the final transcription.
//!
//! A dispatch writes the text artifact, copies the text to the clipboard,
//! optionally fires the paste chord, then applies the retention policy to
//! both session artifacts. Clipboard and paste are each best-effort: one
//! failing never suppresses the other, and neither failure is fatal to the
//! session.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{ArtifactStore, Clipboard, PasteInjector};

/// What actually happened during one dispatch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub text_path: Option<PathBuf>,
    pub clipboard_ok: bool,
    pub pasted: bool,
    /// Artifacts removed by the retention policy.
    pub removed: Vec<PathBuf>,
}

/// Delivers transcriptions and enforces artifact retention.
pub struct OutputDispatcher {
    clipboard: Arc<dyn Clipboard>,
    paste: Arc<dyn PasteInjector>,
    store: ArtifactStore,
    auto_paste: bool,
    keep_files: bool,
}

impl OutputDispatcher {
    pub fn new(
        clipboard: Arc<dyn Clipboard>,
        paste: Arc<dyn PasteInjector>,
        store: ArtifactStore,
        auto_paste: bool,
        keep_files: bool,
    ) -> Self {
        Self {
            clipboard,
            paste,
            store,
            auto_paste,
            keep_files,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Deliver `text` for the session that started at `started_at`.
    ///
    /// `audio_path` is the already-written audio artifact, if any; it is
    /// subject to the same retention policy as the text artifact.
    pub fn dispatch(
        &self,
        started_at: &DateTime<Utc>,
        audio_path: Option<&PathBuf>,
        text: &str,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        // The durable artifact comes first so the text survives any
        // clipboard or paste failure.
        match self.store.save_text(started_at, text) {
            Ok(path) => report.text_path = Some(path),
            Err(e) => warn!(error = %e, "Failed to write transcription artifact"),
        }

        match self.clipboard.set_text(text) {
            Ok(()) => {
                report.clipboard_ok = true;
                info!(chars = text.len(), "Transcription copied to clipboard");
            }
            Err(e) => warn!(error = %e, "Clipboard copy failed"),
        }

        if self.auto_paste {
            match self.paste.paste() {
                Ok(()) => {
                    report.pasted = true;
                    info!("Paste chord sent");
                }
                Err(e) => warn!(error = %e, "Paste injection failed"),
            }
        }

        if !self.keep_files {
            if let Some(path) = audio_path {
                self.store.remove(path);
                report.removed.push(path.clone());
            }
            if let Some(ref path) = report.text_path {
                self.store.remove(path);
                report.removed.push(path.clone());
            }
        }

        report
    }

    /// Retention action for a session that produced no text.
    ///
    /// The audio artifact was written before transcription; without a
    /// transcription to pair it with, it is only kept when retention asks
    /// for it.
    pub fn discard(&self, audio_path: Option<&PathBuf>) {
        if self.keep_files {
            return;
        }
        if let Some(path) = audio_path {
            self.store.remove(path);
        }
    }
}
