//! Murmur output crate - transcription delivery and artifact retention.
//!
//! Owns everything that happens to a transcription once it exists: the
//! clipboard copy, the optional paste keystroke, and the per-session
//! audio/text artifacts on disk. The `Clipboard` and `PasteInjector`
//! traits are the seams for OS integration; real backends live behind
//! the `os` feature and mocks cover tests and headless platforms.

use std::sync::Mutex;

use murmur_core::error::{MurmurError, Result};

pub mod artifact;
pub mod dispatch;
#[cfg(feature = "os")]
pub mod os;

pub use artifact::ArtifactStore;
pub use dispatch::{DispatchReport, OutputDispatcher};

/// Puts text on the system clipboard.
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Sends the platform paste keystroke to the focused application.
pub trait PasteInjector: Send + Sync {
    fn paste(&self) -> Result<()>;
}

/// Clipboard mock that records what was copied.
#[derive(Default)]
pub struct MockClipboard {
    contents: Mutex<Vec<String>>,
    fail: Option<String>,
}

impl MockClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard whose `set_text` always fails.
    pub fn failing(reason: &str) -> Self {
        Self {
            contents: Mutex::new(Vec::new()),
            fail: Some(reason.to_string()),
        }
    }

    /// Every text copied so far, oldest first.
    pub fn copied(&self) -> Vec<String> {
        self.contents.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Clipboard for MockClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        if let Some(ref reason) = self.fail {
            return Err(MurmurError::Clipboard(reason.clone()));
        }
        if let Ok(mut contents) = self.contents.lock() {
            contents.push(text.to_string());
        }
        Ok(())
    }
}

/// Paste mock that counts invocations.
#[derive(Default)]
pub struct MockPaste {
    count: Mutex<usize>,
    fail: Option<String>,
}

impl MockPaste {
    pub fn new() -> Self {
        Self::default()
    }

    /// A paste injector whose `paste` always fails.
    pub fn failing(reason: &str) -> Self {
        Self {
            count: Mutex::new(0),
            fail: Some(reason.to_string()),
        }
    }

    pub fn pastes(&self) -> usize {
        self.count.lock().map(|c| *c).unwrap_or(0)
    }
}

impl PasteInjector for MockPaste {
    fn paste(&self) -> Result<()> {
        if let Some(ref reason) = self.fail {
            return Err(MurmurError::Injection(reason.clone()));
        }
        if let Ok(mut count) = self.count.lock() {
            *count += 1;
        }
        Ok(())
    }
}
