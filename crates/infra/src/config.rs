//! Configuration loading and representation.

use anyhow::{Context, bail};

/// Environment variable overriding [`DirectoryConfig::default_page_size`].
pub const PAGE_SIZE_ENV: &str = "ORGDESK_PAGE_SIZE";
/// Environment variable overriding [`DirectoryConfig::max_page_size`].
pub const MAX_PAGE_SIZE_ENV: &str = "ORGDESK_MAX_PAGE_SIZE";

/// Tunables of the directory services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryConfig {
    /// Page size used when a list request does not ask for one.
    pub default_page_size: usize,
    /// Upper bound applied to every requested page size.
    pub max_page_size: usize,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 1000,
        }
    }
}

impl DirectoryConfig {
    pub fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    pub fn with_max_page_size(mut self, size: usize) -> Self {
        self.max_page_size = size;
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_page_size == 0 {
            bail!("max page size must be at least 1");
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            bail!(
                "default page size {} must be within 1..={}",
                self.default_page_size,
                self.max_page_size
            );
        }
        Ok(())
    }

    /// Load from process environment, falling back to defaults for unset keys.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (tests, embedded settings).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(MAX_PAGE_SIZE_ENV) {
            config.max_page_size = raw
                .trim()
                .parse()
                .with_context(|| {
                    format!("{MAX_PAGE_SIZE_ENV} must be a positive integer, got {raw:?}")
                })?;
        }
        if let Some(raw) = lookup(PAGE_SIZE_ENV) {
            config.default_page_size = raw
                .trim()
                .parse()
                .with_context(|| {
                    format!("{PAGE_SIZE_ENV} must be a positive integer, got {raw:?}")
                })?;
        }

        config.validate().context("invalid directory configuration")?;
        Ok(config)
    }

    /// Resolve the page size for a request: default when absent, clamped to `1..=max`.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}
