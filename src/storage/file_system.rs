use chrono::Utc;
use std::fs;
use std::path::PathBuf;

use super::models::Preferences;
use crate::error::StorageError;

const TOKEN_FILE: &str = "token.txt";
const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Clone, Debug)]
pub struct ClientStorage {
    base_path: PathBuf,
}

impl ClientStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_path
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path)?;
        Ok(())
    }

    /// Persist the bearer token returned by login
    pub fn save_token(&self, token: &str) -> Result<(), StorageError> {
        self.ensure_dir()?;
        fs::write(self.base_path.join(TOKEN_FILE), token)?;
        Ok(())
    }

    /// Load the bearer token, `None` when absent or blank
    pub fn load_token(&self) -> Result<Option<String>, StorageError> {
        let path = self.base_path.join(TOKEN_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let token = fs::read_to_string(path)?;
        let token = token.trim();
        if token.is_empty() {
            Ok(None)
        } else {
            Ok(Some(token.to_string()))
        }
    }

    /// Remove the stored token; missing token is not an error
    pub fn clear_token(&self) -> Result<(), StorageError> {
        let path = self.base_path.join(TOKEN_FILE);
        if path.exists() {
            fs::remove_file(path)?;
            log::info!("Stored token removed");
        }
        Ok(())
    }

    /// Load preferences, or defaults if the file doesn't exist
    pub fn load_preferences(&self) -> Result<Preferences, StorageError> {
        let path = self.base_path.join(PREFERENCES_FILE);
        if !path.exists() {
            return Ok(Preferences::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save_preferences(&self, prefs: &Preferences) -> Result<(), StorageError> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(prefs)?;
        fs::write(self.base_path.join(PREFERENCES_FILE), json)?;
        Ok(())
    }

    /// Flip the dark mode flag and persist it, returning the new value
    pub fn toggle_dark_mode(&self) -> Result<bool, StorageError> {
        let mut prefs = self.load_preferences()?;
        prefs.dark_mode = !prefs.dark_mode;
        prefs.updated_at = Some(Utc::now());
        self.save_preferences(&prefs)?;
        Ok(prefs.dark_mode)
    }
}
