pub mod calls;
pub mod conversation;
pub mod language;
pub mod llm;
pub mod metrics;
pub mod state;
pub mod stt;
pub mod tts;
pub mod twiml;

// Re-export commonly used types for convenience
pub use calls::{CallDirection, CallRegistry, CallSession, GlobalMetrics};
pub use conversation::{ConversationEvent, ConversationSession, EventOutcome};
pub use language::{LanguageManager, LanguageProfile, LanguageProfileTable};
pub use metrics::PerformanceMonitor;
pub use twiml::CallFlowDocumentBuilder;

// Re-export CoreState for external use
pub use state::{CoreState, CoreStateError, ServiceStatus};
