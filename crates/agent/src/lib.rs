//! Conversational agent: the linguistic-completeness gate, the confidence
//! router, the conversation state machine, and the per-session actor that
//! ties them together with C1/C2/C3 from `voice-agent-pipeline`.

pub mod completeness;
pub mod conversation_fsm;
pub mod orchestrator;
pub mod router;

pub use completeness::{CompletenessGate, CompletenessVerdict};
pub use conversation_fsm::{ConversationAction, ConversationFsm, ProcessingOutcome};
pub use orchestrator::{SessionActor, SessionAdapters, SessionInput, SessionRegistry};
pub use router::{route, RouterVerdict};

pub use voice_agent_core::error::AgentError;
