//! Application service: resolve deployment target from flags and free text.

use crate::application::ports::{IntentClassifier, ProgressReporter};
use crate::domain::classify::{DEFAULT_PROVIDER, Intent, parse_intent};
use crate::domain::framework::Framework;

/// Instance size used when neither a flag nor the request names one.
pub const DEFAULT_INSTANCE_SIZE: &str = "t2.micro";

/// What the user asked for on the command line.
#[derive(Debug, Clone, Default)]
pub struct TargetFlags {
    pub provider: Option<String>,
    pub size: Option<String>,
    pub framework: Option<Framework>,
    /// Free-form request such as "deploy this flask app on a t2.small".
    pub request: Option<String>,
}

/// Fully resolved deployment target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub provider: String,
    pub instance_size: String,
    pub framework: Option<Framework>,
}

/// Merge explicit flags with the classified request. Flags always win.
pub async fn resolve_target(
    flags: TargetFlags,
    classifier: &impl IntentClassifier,
    reporter: &impl ProgressReporter,
) -> ResolvedTarget {
    let intent = match flags.request.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => match classifier.classify_intent(text).await {
            Ok(answer) => parse_intent(&answer),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "intent classifier failed");
                reporter.warn("could not interpret the request; using defaults");
                Intent::fallback()
            }
        },
        _ => Intent {
            cloud_provider: None,
            application_type: None,
            resource_size: None,
        },
    };
    tracing::debug!(?intent, "intent resolved");

    ResolvedTarget {
        provider: flags
            .provider
            .or(intent.cloud_provider)
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
        instance_size: flags
            .size
            .or(intent.resource_size)
            .unwrap_or_else(|| DEFAULT_INSTANCE_SIZE.to_string()),
        framework: flags.framework.or_else(|| {
            intent
                .application_type
                .as_deref()
                .map(Framework::from_hint)
                .filter(|f| *f != Framework::Unknown)
        }),
    }
}
