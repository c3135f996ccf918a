//! Eligibility check run before anything is advertised.

use std::fmt;

use async_trait::async_trait;
use tracing::trace;

/// Answers whether the process runs in an automated CI/bot context.
///
/// The guard trusts this verdict unconditionally. Swap the implementation to
/// change how bots are detected; the guard itself never inspects the
/// environment.
#[async_trait]
pub trait BotDetector: Send + Sync {
    async fn is_running_on_bot(&self) -> bool;
}

/// Why an advertisement was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// `enable_local_discovery` is off.
    Disabled,
    /// The bot detector reported a CI/bot context.
    Bot,
}

impl SuppressReason {
    /// Diagnostic emitted when advertisement is suppressed for this reason.
    pub fn message(&self) -> &'static str {
        match self {
            SuppressReason::Disabled => "mDNS local discovery is disabled.",
            SuppressReason::Bot => "Not advertising mDNS on CI/bot.",
        }
    }
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of the eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Suppressed(SuppressReason),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// Decide whether advertisement may proceed.
///
/// The configuration flag is checked first; the detector is only queried
/// when local discovery is enabled.
pub async fn evaluate(bot_detector: &dyn BotDetector, enable_local_discovery: bool) -> Eligibility {
    if !enable_local_discovery {
        trace!("{}", SuppressReason::Disabled);
        return Eligibility::Suppressed(SuppressReason::Disabled);
    }
    if bot_detector.is_running_on_bot().await {
        trace!("{}", SuppressReason::Bot);
        return Eligibility::Suppressed(SuppressReason::Bot);
    }
    Eligibility::Eligible
}

/// Boolean form of [`evaluate`].
pub async fn is_eligible(bot_detector: &dyn BotDetector, enable_local_discovery: bool) -> bool {
    evaluate(bot_detector, enable_local_discovery)
        .await
        .is_eligible()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDetector {
        verdict: bool,
        calls: AtomicUsize,
    }

    impl CountingDetector {
        fn new(verdict: bool) -> Self {
            Self {
                verdict,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BotDetector for CountingDetector {
        async fn is_running_on_bot(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.verdict
        }
    }

    #[tokio::test]
    async fn test_truth_table() {
        for enabled in [false, true] {
            for bot in [false, true] {
                let detector = CountingDetector::new(bot);
                assert_eq!(
                    is_eligible(&detector, enabled).await,
                    enabled && !bot,
                    "enabled={enabled} bot={bot}"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_disabled_skips_detector() {
        let detector = CountingDetector::new(false);
        let result = evaluate(&detector, false).await;
        assert_eq!(result, Eligibility::Suppressed(SuppressReason::Disabled));
        assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bot_reason() {
        let detector = CountingDetector::new(true);
        let result = evaluate(&detector, true).await;
        assert_eq!(result, Eligibility::Suppressed(SuppressReason::Bot));
        assert_eq!(detector.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_suppress_reason_messages() {
        assert_eq!(
            SuppressReason::Disabled.to_string(),
            "mDNS local discovery is disabled."
        );
        assert_eq!(SuppressReason::Bot.to_string(), "Not advertising mDNS on CI/bot.");
    }
}
