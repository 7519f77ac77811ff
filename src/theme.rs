// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "currency-exchanger";
const PREFERENCES_NAME: &str = "preferences";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredPreferences {
    dark_mode: bool,
}

/// Light/dark presentation flag, persisted in the user's config directory.
/// Has no bearing on conversions.
#[derive(Debug)]
pub struct ThemePreference {
    path: PathBuf,
    dark_mode: bool,
}

impl ThemePreference {
    pub fn default_path() -> Result<PathBuf> {
        confy::get_configuration_file_path(APP_NAME, PREFERENCES_NAME)
            .context("Failed to locate preferences file")
    }

    pub fn load() -> Result<Self> {
        Ok(Self::load_from(Self::default_path()?))
    }

    /// Missing or unreadable preferences mean light mode.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Self {
                path,
                dark_mode: false,
            };
        }

        let dark_mode = match confy::load_path::<StoredPreferences>(&path) {
            Ok(stored) => stored.dark_mode,
            Err(e) => {
                log::warn!("Ignoring preferences at {}: {}", path.display(), e);
                false
            }
        };

        Self { path, dark_mode }
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flip the flag and write it back. Returns the new value; the flag is
    /// left untouched when the write fails.
    pub fn toggle(&mut self) -> Result<bool> {
        let stored = StoredPreferences {
            dark_mode: !self.dark_mode,
        };
        confy::store_path(&self.path, stored)
            .with_context(|| format!("Failed to save preferences to {}", self.path.display()))?;
        self.dark_mode = !self.dark_mode;
        log::debug!("Theme set to {}", if self.dark_mode { "dark" } else { "light" });
        Ok(self.dark_mode)
    }
}
