//! Resolver configuration.

/// Environment variable overriding [`ResolverConfig::max_instantiation_depth`].
pub const MAX_DEPTH_ENV: &str = "CREST_MAX_INSTANTIATION_DEPTH";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Longest chain of instantiated bodies, each needed for the inferred
    /// return type of the one calling it, before generic recursion is
    /// reported as unbounded.
    pub max_instantiation_depth: usize,
    /// Report failures found during speculative resolution too.
    pub report_speculative_failures: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            max_instantiation_depth: 64,
            report_speculative_failures: false,
        }
    }
}

impl ResolverConfig {
    /// Defaults, overridden from the environment where set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(depth) = std::env::var(MAX_DEPTH_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&d| d > 0)
        {
            config.max_instantiation_depth = depth;
        }
        config
    }

    #[must_use]
    pub fn with_max_instantiation_depth(mut self, depth: usize) -> Self {
        self.max_instantiation_depth = depth.max(1);
        self
    }

    #[must_use]
    pub fn with_report_speculative_failures(mut self, report: bool) -> Self {
        self.report_speculative_failures = report;
        self
    }
}
