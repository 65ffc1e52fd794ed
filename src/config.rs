//! Session configuration: credentials, storefront and endpoint bases.
//!
//! Credentials are read from plain-text files in a credentials directory.
//! A missing file falls back to an interactive prompt on stdin.

use anyhow::{bail, Context, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;

pub const TOKEN_FILE: &str = "token.dat";
pub const MEDIA_USER_TOKEN_FILE: &str = "media_user_token.dat";
pub const COOKIES_FILE: &str = "cookies.dat";
pub const COUNTRY_CODE_FILE: &str = "country_code.dat";

pub const DEFAULT_SEARCH_BASE: &str = "https://itunes.apple.com";
pub const DEFAULT_API_BASE: &str = "https://amp-api.music.apple.com";

/// Base URLs for the public search endpoint and the authenticated API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub search_base: String,
    pub api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search_base: DEFAULT_SEARCH_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// Everything the Apple Music client needs for one run.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub bearer_token: String,
    pub media_user_token: String,
    pub cookies: String,
    pub storefront: String,
    pub endpoints: Endpoints,
}

impl SessionConfig {
    /// Load credentials from `dir`, prompting on stdin for any missing file.
    pub fn load(dir: &Path, storefront_override: Option<&str>) -> Result<Self> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        Self::load_with_input(dir, storefront_override, &mut input)
    }

    /// Same as [`SessionConfig::load`] with an explicit prompt source.
    pub fn load_with_input<R: BufRead>(
        dir: &Path,
        storefront_override: Option<&str>,
        input: &mut R,
    ) -> Result<Self> {
        let bearer_token = read_credential(
            dir,
            TOKEN_FILE,
            "Please enter your Apple Music Authorization (Bearer token):",
            input,
        )?;
        let media_user_token = read_credential(
            dir,
            MEDIA_USER_TOKEN_FILE,
            "Please enter your media user token:",
            input,
        )?;
        let cookies = read_credential(dir, COOKIES_FILE, "Please enter your cookies:", input)?;

        let storefront = match storefront_override {
            Some(code) => code.to_string(),
            None => read_credential(
                dir,
                COUNTRY_CODE_FILE,
                "Please enter the country code (e.g., DE, UK, US etc.):",
                input,
            )?,
        };
        let storefront = storefront.trim().to_lowercase();
        if storefront.is_empty() {
            bail!("Storefront country code is empty");
        }

        Ok(Self {
            bearer_token: with_bearer_prefix(&bearer_token),
            media_user_token,
            cookies,
            storefront,
            endpoints: Endpoints::default(),
        })
    }
}

/// Add the `Bearer ` scheme when the stored token is bare.
pub fn with_bearer_prefix(token: &str) -> String {
    let token = token.trim();
    if token.starts_with("Bearer ") {
        token.to_string()
    } else {
        format!("Bearer {}", token)
    }
}

fn read_credential<R: BufRead>(
    dir: &Path,
    file_name: &str,
    prompt: &str,
    input: &mut R,
) -> Result<String> {
    let path = dir.join(file_name);
    if path.exists() {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(contents.trim_end_matches(['\n', '\r']).to_string());
    }

    eprintln!("\n{}", prompt);
    io::stderr().flush().ok();

    let mut line = String::new();
    input
        .read_line(&mut line)
        .with_context(|| format!("Failed to read {} from stdin", file_name))?;
    let value = line.trim_end_matches(['\n', '\r']).to_string();
    if value.is_empty() {
        bail!("No value provided for {} (create {})", file_name, path.display());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), TOKEN_FILE, "Bearer abc\n");
        write(dir.path(), MEDIA_USER_TOKEN_FILE, "mut\n");
        write(dir.path(), COOKIES_FILE, "a=b; c=d\n");
        write(dir.path(), COUNTRY_CODE_FILE, "DE\n");

        let mut input = Cursor::new(Vec::new());
        let config = SessionConfig::load_with_input(dir.path(), None, &mut input).unwrap();

        assert_eq!(config.bearer_token, "Bearer abc");
        assert_eq!(config.media_user_token, "mut");
        assert_eq!(config.cookies, "a=b; c=d");
        assert_eq!(config.storefront, "de");
        assert_eq!(config.endpoints, Endpoints::default());
    }

    #[test]
    fn test_missing_files_are_prompted() {
        let dir = tempdir().unwrap();
        write(dir.path(), TOKEN_FILE, "abc");

        let mut input = Cursor::new(b"mut\ncookie=1\nus\n".to_vec());
        let config = SessionConfig::load_with_input(dir.path(), None, &mut input).unwrap();

        assert_eq!(config.bearer_token, "Bearer abc");
        assert_eq!(config.media_user_token, "mut");
        assert_eq!(config.cookies, "cookie=1");
        assert_eq!(config.storefront, "us");
    }

    #[test]
    fn test_storefront_override_skips_file_and_prompt() {
        let dir = tempdir().unwrap();
        write(dir.path(), TOKEN_FILE, "abc");
        write(dir.path(), MEDIA_USER_TOKEN_FILE, "mut");
        write(dir.path(), COOKIES_FILE, "c");

        let mut input = Cursor::new(Vec::new());
        let config =
            SessionConfig::load_with_input(dir.path(), Some("GB"), &mut input).unwrap();
        assert_eq!(config.storefront, "gb");
    }

    #[test]
    fn test_empty_prompt_answer_is_an_error() {
        let dir = tempdir().unwrap();
        let mut input = Cursor::new(b"\n".to_vec());
        let err = SessionConfig::load_with_input(dir.path(), None, &mut input).unwrap_err();
        assert!(err.to_string().contains(TOKEN_FILE));
    }

    #[test]
    fn test_bearer_prefix() {
        assert_eq!(with_bearer_prefix("xyz"), "Bearer xyz");
        assert_eq!(with_bearer_prefix("Bearer xyz"), "Bearer xyz");
        assert_eq!(with_bearer_prefix(" xyz\n"), "Bearer xyz");
    }
}
