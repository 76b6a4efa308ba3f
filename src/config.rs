// Runtime settings. Everything comes from the environment so the tool can
// be pointed at a different OSF instance (or a local test server) without
// recompiling.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "http://files.osf.io/v1/resources";
const TOKEN_FILE: &str = ".osf_pat";

/// Connection settings for the OSF files API.
#[derive(Clone, Debug)]
pub struct Settings {
    pub api_url: String,
    pub token: Option<String>,
}

impl Settings {
    /// Read `OSF_API_URL` and `OSF_PAT`, after loading a `.env` file from
    /// the working directory (variables already set win). When `OSF_PAT`
    /// is still not set the token is looked up in `~/.osf_pat`.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!("loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => warn!(error = %e, "ignoring unreadable .env file"),
        }
        Self::from_process_env()
    }

    /// Like [`Settings::from_env`] with an explicit env file.
    pub fn from_env_file(path: &Path) -> Self {
        if let Err(e) = dotenvy::from_path(path) {
            if !e.not_found() {
                warn!(error = %e, path = %path.display(), "ignoring unreadable env file");
            }
        }
        Self::from_process_env()
    }

    fn from_process_env() -> Self {
        let api_url = std::env::var("OSF_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let token = std::env::var("OSF_PAT")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(load_token);
        Settings {
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn new(api_url: &str, token: Option<&str>) -> Self {
        Settings {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        }
    }

    /// One-line console warning shown at startup when no token was found.
    pub fn missing_token_notice(&self) -> Option<String> {
        if self.token.is_some() {
            return None;
        }
        Some(format!(
            "No OSF token found: set OSF_PAT (environment or .env) or write it to ~/{}. \
             Uploads will be sent without credentials.",
            TOKEN_FILE
        ))
    }
}

fn token_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(TOKEN_FILE)
}

fn load_token() -> Option<String> {
    let data = std::fs::read_to_string(token_path()).ok()?;
    let token = data.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Answers offered as defaults at each prompt. Updated with the user's
/// previous answers on every pass through the prompt loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptDefaults {
    pub dir: String,
    pub study: String,
    pub version: String,
    pub osf: String,
    pub write: String,
}

impl Default for PromptDefaults {
    fn default() -> Self {
        PromptDefaults {
            dir: "https://acclab.psy.ox.ac.uk/~mj221/ESM/data/public/".into(),
            study: "coolStudy".into(),
            version: "M-m-r".into(),
            osf: String::new(),
            write: "no".into(),
        }
    }
}
