//! Configuration for a walk.
//!
//! All walk behaviour is controlled through [`WalkConfig`], built via its
//! [`WalkConfigBuilder`]. The book itself is not part of the config: it is
//! passed separately as a [`crate::book::BookProfile`] so the same settings
//! can be reused across books.

use crate::error::SerialError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Configuration for walking a serial.
///
/// # Example
/// ```rust
/// use serial2md::WalkConfig;
///
/// let config = WalkConfig::builder()
///     .output_dir("chapters")
///     .skip_existing(true)
///     .max_retries(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.extension, "md");
/// ```
#[derive(Clone)]
pub struct WalkConfig {
    /// Directory chapter files are written to. Default: `data`.
    pub output_dir: PathBuf,

    /// Extension of chapter files, without the dot. Default: `md`.
    pub extension: String,

    /// Leave chapters whose file already exists untouched. Default: false.
    ///
    /// The page is still fetched and parsed: its next-chapter link and
    /// numbering are needed to keep walking.
    pub skip_existing: bool,

    /// Stop after this many chapters. Default: no limit.
    pub limit: Option<usize>,

    /// Start from this URL instead of the book's first chapter.
    ///
    /// Numbering still starts from `(1, 0)`, so this is mainly useful for
    /// books that moved to a new host.
    pub start_url: Option<String>,

    /// Retries per page on transient fetch failures. Default: 0 (fail fast).
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-request timeout in seconds. Default: 60.
    pub fetch_timeout_secs: u64,

    /// User-Agent sent with every request.
    pub user_agent: String,

    /// Per-chapter progress events. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            extension: "md".to_string(),
            skip_existing: false,
            limit: None,
            start_url: None,
            max_retries: 0,
            retry_backoff_ms: 500,
            fetch_timeout_secs: 60,
            user_agent: concat!("serial2md/", env!("CARGO_PKG_VERSION")).to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for WalkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkConfig")
            .field("output_dir", &self.output_dir)
            .field("extension", &self.extension)
            .field("skip_existing", &self.skip_existing)
            .field("limit", &self.limit)
            .field("start_url", &self.start_url)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn WalkProgressCallback>"),
            )
            .finish()
    }
}

impl WalkConfig {
    /// Create a new builder for `WalkConfig`.
    pub fn builder() -> WalkConfigBuilder {
        WalkConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`WalkConfig`].
#[derive(Debug)]
pub struct WalkConfigBuilder {
    config: WalkConfig,
}

impl WalkConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.config.extension = ext.into();
        self
    }

    pub fn skip_existing(mut self, v: bool) -> Self {
        self.config.skip_existing = v;
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.config.limit = Some(n);
        self
    }

    pub fn start_url(mut self, url: impl Into<String>) -> Self {
        self.config.start_url = Some(url.into());
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WalkConfig, SerialError> {
        let c = &self.config;
        if c.extension.is_empty() || c.extension.contains(['.', '/', '\\']) {
            return Err(SerialError::InvalidConfig(format!(
                "extension must be a bare suffix like 'md', got '{}'",
                c.extension
            )));
        }
        if c.fetch_timeout_secs == 0 {
            return Err(SerialError::InvalidConfig(
                "fetch timeout must be ≥ 1 second".into(),
            ));
        }
        if c.limit == Some(0) {
            return Err(SerialError::InvalidConfig("limit must be ≥ 1".into()));
        }
        if let Some(ref url) = c.start_url {
            url::Url::parse(url).map_err(|e| SerialError::InvalidUrl {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(self.config)
    }
}
