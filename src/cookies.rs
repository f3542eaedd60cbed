//! Cookie persistence for Google Scholar requests.
//!
//! Scholar serves CAPTCHAs to cookie-less clients quickly; cookies exported
//! from a browser session are stored here and sent with every profile request.

use crate::error::{PubmetaError, Result};
use crate::store::write_atomic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default cookie file path: `~/.pubmeta_cookies.json`
fn default_cookie_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".pubmeta_cookies.json"))
        .ok_or_else(|| PubmetaError::Config("Cannot determine home directory".to_string()))
}

/// Cookie entry in the browser-export JSON format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, alias = "httpOnly")]
    pub http_only: bool,
    #[serde(default, alias = "expirationDate")]
    pub expires: Option<f64>,
}

/// Cookie manager for loading and saving cookies
pub struct CookieManager {
    path: PathBuf,
}

impl CookieManager {
    /// Create a new CookieManager with default path
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: default_cookie_path()?,
        })
    }

    /// Create a new CookieManager with custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load cookies from file
    ///
    /// Returns empty vec if file doesn't exist or is invalid
    pub fn load(&self) -> Vec<Cookie> {
        if !self.path.exists() {
            debug!("Cookie file not found: {:?}", self.path);
            return Vec::new();
        }

        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<Vec<Cookie>>(&content) {
                Ok(cookies) => cookies,
                Err(e) => {
                    warn!("Failed to parse cookies: {}", e);
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("Failed to read cookie file: {}", e);
                Vec::new()
            }
        }
    }

    /// Save cookies to file
    pub fn save(&self, cookies: &[Cookie]) -> Result<()> {
        let content = serde_json::to_vec_pretty(cookies)?;
        write_atomic(&self.path, &content)?;
        info!("Saved {} cookies to {:?}", cookies.len(), self.path);
        Ok(())
    }

    /// Import a browser cookie export, keeping only Google cookies.
    ///
    /// Returns the number of cookies stored.
    pub fn import(&self, export: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(export)?;
        let cookies: Vec<Cookie> = serde_json::from_str(&content)?;
        let google: Vec<Cookie> = cookies
            .into_iter()
            .filter(|c| c.domain.contains("google"))
            .collect();
        if google.is_empty() {
            return Err(PubmetaError::Validation(format!(
                "no google.com cookies in {}",
                export.display()
            )));
        }
        self.save(&google)?;
        Ok(google.len())
    }

    /// Clear stored cookies
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            info!("Cleared cookies at {:?}", self.path);
        }
        Ok(())
    }
}

impl Default for CookieManager {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            path: PathBuf::from(".pubmeta_cookies.json"),
        })
    }
}
