//! Stub rewriter for testing and offline mode

use async_trait::async_trait;
use gentle_post_domain::{RewriteError, ToneRewriter};

/// Word substitutions applied by the softening mode
const SOFTENINGS: &[(&str, &str)] = &[
    ("最悪", "大変"),
    ("嫌い", "苦手"),
    ("ムカつく", "もやもやする"),
    ("うざい", "少し気になる"),
    ("worst", "hardest"),
    ("terrible", "tough"),
    ("awful", "difficult"),
    ("hate", "don't enjoy"),
    ("bad", "rough"),
];

const GENTLE_PREFIX: &str = "Gently put: ";

/// Stub rewriter that returns configurable responses
pub struct StubRewriter {
    response: Option<String>,
    error: Option<RewriteError>,
}

impl StubRewriter {
    /// Create a stub that always returns the same text
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            error: None,
        }
    }

    /// Create a stub that always returns an error
    pub fn with_error(error: RewriteError) -> Self {
        Self {
            response: None,
            error: Some(error),
        }
    }

    /// Create a stub that softens known harsh words
    pub fn softening() -> Self {
        Self {
            response: None,
            error: None,
        }
    }
}

impl Default for StubRewriter {
    fn default() -> Self {
        Self::softening()
    }
}

fn soften(text: &str) -> String {
    let softened = SOFTENINGS
        .iter()
        .fold(text.to_string(), |acc, (harsh, gentle)| acc.replace(harsh, gentle));

    if softened == text {
        format!("{}{}", GENTLE_PREFIX, text.trim())
    } else {
        softened.trim().to_string()
    }
}

#[async_trait]
impl ToneRewriter for StubRewriter {
    async fn rewrite(&self, text: &str) -> Result<String, RewriteError> {
        if let Some(ref error) = self.error {
            return Err(match error {
                RewriteError::Api(msg) => RewriteError::Api(msg.clone()),
                RewriteError::InvalidFormat(msg) => RewriteError::InvalidFormat(msg.clone()),
                RewriteError::Empty => RewriteError::Empty,
                RewriteError::RateLimited => RewriteError::RateLimited,
                RewriteError::Timeout => RewriteError::Timeout,
                RewriteError::Config(msg) => RewriteError::Config(msg.clone()),
            });
        }

        if let Some(ref response) = self.response {
            return Ok(response.clone());
        }

        Ok(soften(text))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
