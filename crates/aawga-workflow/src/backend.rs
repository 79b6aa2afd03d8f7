//! Generation backend selection shared by all stages.

use std::fmt;
use std::sync::Arc;

use aawga_llm::{CompletionOptions, Provider};
use aawga_settings::BackendKind;

/// Where a stage gets its text from.
///
/// `Stub` never touches the network: stages return deterministic
/// placeholders derived from their inputs.
#[derive(Clone)]
pub enum GenerationBackend {
    /// Deterministic placeholders.
    Stub,
    /// A real provider.
    Live {
        /// Provider shared by all stages.
        provider: Arc<dyn Provider>,
        /// Options passed on every call.
        options: CompletionOptions,
    },
}

impl GenerationBackend {
    /// Live backend with provider defaults.
    pub fn live(provider: Arc<dyn Provider>) -> Self {
        Self::Live {
            provider,
            options: CompletionOptions::default(),
        }
    }

    /// Which kind of backend this is.
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Stub => BackendKind::Stub,
            Self::Live { .. } => BackendKind::Live,
        }
    }
}

impl fmt::Debug for GenerationBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stub => f.write_str("Stub"),
            Self::Live { provider, options } => f
                .debug_struct("Live")
                .field("model", &provider.model())
                .field("options", options)
                .finish(),
        }
    }
}
