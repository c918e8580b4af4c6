/// Configuration for a rate limit rule.
#[derive(Debug, Clone)]
pub struct RateLimitRule {
    /// The route or category name (e.g., "chat").
    pub category: String,
    /// Maximum number of accepted requests in the window.
    pub max_attempts: u32,
    /// Sliding window length in seconds.
    pub window_seconds: i64,
}

impl RateLimitRule {
    /// Creates a new rate limit rule.
    #[must_use]
    pub fn new(category: impl Into<String>, max_attempts: u32, window_seconds: i64) -> Self {
        Self {
            category: category.into(),
            max_attempts,
            window_seconds,
        }
    }

    /// Default rule for the chat endpoint: 10 requests per rolling minute.
    #[must_use]
    pub fn chat() -> Self {
        Self::new("chat", 10, 60)
    }
}
