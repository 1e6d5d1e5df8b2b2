//! Real OS backends for clipboard and paste injection.
//!
//! Both handles are created per call: neither `arboard::Clipboard` nor
//! `enigo::Enigo` is `Sync` on every platform, and dispatch happens at
//! most once per session so the setup cost is irrelevant.

use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use tracing::debug;

use murmur_core::error::{MurmurError, Result};

use crate::{Clipboard, PasteInjector};

/// System clipboard via arboard.
#[derive(Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| MurmurError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| MurmurError::Clipboard(e.to_string()))?;
        debug!(chars = text.len(), "Clipboard set");
        Ok(())
    }
}

/// Sends the platform paste chord via synthesized keystrokes.
#[derive(Default)]
pub struct PasteChord;

impl PasteChord {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "macos")]
    const MODIFIER: Key = Key::Meta;
    #[cfg(not(target_os = "macos"))]
    const MODIFIER: Key = Key::Control;
}

impl PasteInjector for PasteChord {
    fn paste(&self) -> Result<()> {
        let mut enigo =
            Enigo::new(&Settings::default()).map_err(|e| MurmurError::Injection(e.to_string()))?;
        enigo
            .key(Self::MODIFIER, Direction::Press)
            .map_err(|e| MurmurError::Injection(e.to_string()))?;
        let result = enigo
            .key(Key::Unicode('v'), Direction::Click)
            .map_err(|e| MurmurError::Injection(e.to_string()));
        // Release the modifier even if the click failed, or the user's
        // keyboard is left in a held-modifier state.
        enigo
            .key(Self::MODIFIER, Direction::Release)
            .map_err(|e| MurmurError::Injection(e.to_string()))?;
        result?;
        debug!("Paste chord injected");
        Ok(())
    }
}
