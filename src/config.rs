use anyhow::{anyhow, Context, Result};
use url::Url;

pub const API_URL_ENV: &str = "FORMCRAFT_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8000/";

/// Where the forms API lives. Endpoint paths are resolved against it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    base_url: Url,
}

impl ApiConfig {
    /// Parses an `http://` or `https://` base URI.
    ///
    /// The path is normalised to end in `/` so that relative endpoint
    /// paths extend it instead of replacing its last segment.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let mut url = Url::parse(uri).map_err(|e| anyhow!("Invalid API URI: {}", e))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(anyhow!("Unsupported API scheme: {}", other)),
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self { base_url: url })
    }

    /// Reads `FORMCRAFT_API_URL`, falling back to the local development server.
    pub fn from_env() -> Result<Self> {
        let uri = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::from_uri(&uri).with_context(|| format!("{} is not a usable API URL", API_URL_ENV))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> std::result::Result<Url, url::ParseError> {
        self.base_url.join(path.trim_start_matches('/'))
    }

    /// Appends `segments` to the base path, percent-encoding each one, and
    /// ends the path with `/`.
    pub fn endpoint_segments(&self, segments: &[&str]) -> std::result::Result<Url, url::ParseError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL must parse"),
        }
    }
}
