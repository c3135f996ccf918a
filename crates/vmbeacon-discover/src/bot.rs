//! Environment-based CI/bot detection.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::guard::BotDetector;

/// Variables whose mere presence marks a CI run.
const CI_MARKERS: &[&str] = &[
    "CI",
    "CONTINUOUS_INTEGRATION",
    "GITHUB_ACTIONS",
    "TRAVIS",
    "CIRRUS_CI",
    "TF_BUILD",
    "APPVEYOR",
    "GITLAB_CI",
    "BUILDKITE",
    "TEAMCITY_VERSION",
    "JENKINS_URL",
    "CODEBUILD_BUILD_ID",
    "CHROME_HEADLESS",
    "LUCI_CONTEXT",
    "SWARMING_TASK_ID",
];

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Detects CI/bot contexts from environment markers.
///
/// `BOT=true` or `BOT=false` decides outright. Otherwise any well-known CI
/// marker (or `BUILD_ID` together with `BUILD_URL`) counts as a bot. The
/// verdict is computed on first use and cached.
pub struct CiBotDetector {
    lookup: EnvLookup,
    verdict: OnceCell<bool>,
}

impl CiBotDetector {
    /// Detector reading the process environment.
    pub fn new() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }

    /// Detector reading a fixed set of variables.
    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        Self::with_lookup(move |name| vars.get(name).cloned())
    }

    fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
            verdict: OnceCell::new(),
        }
    }

    fn detect(&self) -> bool {
        if let Some(bot) = (self.lookup)("BOT") {
            match bot.as_str() {
                "true" => return true,
                "false" => return false,
                _ => {}
            }
        }

        if let Some(marker) = CI_MARKERS
            .iter()
            .copied()
            .find(|name| (self.lookup)(name).is_some())
        {
            debug!(marker = %marker, "CI environment marker found");
            return true;
        }

        (self.lookup)("BUILD_ID").is_some() && (self.lookup)("BUILD_URL").is_some()
    }
}

impl Default for CiBotDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BotDetector for CiBotDetector {
    async fn is_running_on_bot(&self) -> bool {
        *self
            .verdict
            .get_or_init(|| async { self.detect() })
            .await
    }
}
