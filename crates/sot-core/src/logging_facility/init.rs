//! Logging initialization module
//!
//! Provides a single initialization point for the logging facility.

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output
    Development,
    /// JSON structured output, one object per line
    Production,
    /// Test capture mode for deterministic testing
    Test,
}

impl Profile {
    /// Parse a `--log-format` value (`pretty` or `json`)
    pub fn from_format(format: &str) -> Option<Self> {
        match format {
            "pretty" => Some(Profile::Development),
            "json" => Some(Profile::Production),
            _ => None,
        }
    }
}

static INIT_ONCE: Once = Once::new();

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("sot=debug")
        } else {
            EnvFilter::new("sot=warn")
        }
    })
}

/// Initialize the logging facility
///
/// This function should be called once at process start, before the
/// index is opened. `RUST_LOG` overrides the level chosen by `verbose`.
/// Later calls, and calls after another global subscriber was installed,
/// do nothing.
///
/// # Example
///
/// ```
/// use sot_core::logging_facility::{init, Profile};
///
/// init(Profile::Production, true);
/// ```
pub fn init(profile: Profile, verbose: bool) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(default_filter(verbose))
                .try_init()
                .ok();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(default_filter(verbose))
                .try_init()
                .ok();
        }
        Profile::Test => {
            // Capture is wired separately via init_test_capture()
            tracing_subscriber::registry().try_init().ok();
        }
    });
}
