//! Intent classification and routing for the muse chat assistant.

pub mod clarification;
pub mod decision;
pub mod lexicon;
pub mod patterns;
pub mod providers;
pub mod router;
pub mod scoring;
pub mod session;

pub use clarification::{ClarificationAdvisor, IntentLabel};
pub use decision::{Affinity, Analysis, DecisionEngine};
pub use providers::{ClarificationProvider, ImageGenerator, ProviderError, TextGenerator};
pub use router::{RoutedTurn, Router};
pub use scoring::DecisionFactors;
pub use session::ChatSession;
