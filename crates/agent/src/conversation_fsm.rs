//! Conversation state machine (C4, §4.4).

use voice_agent_config::constants::conversation as conversation_const;
use voice_agent_core::conversation::{ConversationState, DialogueState, TurnRole};

/// What `PROCESSING` decided about the latest ASR result, after the
/// completeness gate and router have both run.
#[derive(Debug, Clone)]
pub enum ProcessingOutcome {
    EmptyText,
    Incomplete,
    Rejected,
    Accepted { text: String },
}

/// Side effect the caller must perform after a transition.
#[derive(Debug, Clone)]
pub enum ConversationAction {
    PlayGreeting,
    ArmListening,
    InvokeAsr,
    EnterWaitingIncomplete,
    AskToRepeat,
    CallLlmAndRespond { text: String },
    Escalate,
    CloseSession,
    EmitError(String),
    None,
}

pub struct ConversationFsm {
    pub state: ConversationState,
}

impl ConversationFsm {
    pub fn new() -> Self {
        Self {
            state: ConversationState::new(),
        }
    }

    pub fn dialogue_state(&self) -> DialogueState {
        self.state.dialogue_state
    }

    pub fn session_opened(&mut self) -> ConversationAction {
        debug_assert_eq!(self.state.dialogue_state, DialogueState::Init);
        self.state.dialogue_state = DialogueState::Greeting;
        ConversationAction::PlayGreeting
    }

    pub fn greeting_dispatched(&mut self) -> ConversationAction {
        debug_assert_eq!(self.state.dialogue_state, DialogueState::Greeting);
        self.state.dialogue_state = DialogueState::Listening;
        ConversationAction::ArmListening
    }

    pub fn turn_end_received(&mut self) -> ConversationAction {
        debug_assert_eq!(self.state.dialogue_state, DialogueState::Listening);
        self.state.dialogue_state = DialogueState::Processing;
        ConversationAction::InvokeAsr
    }

    /// `outcome` is computed by the caller: empty-text check first, then the
    /// completeness gate, then (only if complete) the router.
    pub fn asr_processed(&mut self, outcome: ProcessingOutcome) -> ConversationAction {
        debug_assert_eq!(self.state.dialogue_state, DialogueState::Processing);
        match outcome {
            ProcessingOutcome::EmptyText => self.clarify_or_escalate(),
            ProcessingOutcome::Incomplete => {
                self.state.dialogue_state = DialogueState::Listening;
                ConversationAction::EnterWaitingIncomplete
            }
            ProcessingOutcome::Rejected => self.clarify_or_escalate(),
            ProcessingOutcome::Accepted { text } => {
                self.state.push_turn(TurnRole::User, text.clone());
                self.state.dialogue_state = DialogueState::Responding;
                ConversationAction::CallLlmAndRespond { text }
            }
        }
    }

    fn clarify_or_escalate(&mut self) -> ConversationAction {
        self.state.clarification_count += 1;
        if self.state.clarification_count > conversation_const::MAX_CLARIFICATIONS {
            self.state.dialogue_state = DialogueState::Error;
            ConversationAction::Escalate
        } else {
            self.state.dialogue_state = DialogueState::Clarifying;
            ConversationAction::AskToRepeat
        }
    }

    pub fn tts_dispatched(&mut self, reply_text: String) -> ConversationAction {
        debug_assert_eq!(self.state.dialogue_state, DialogueState::Responding);
        self.state.push_turn(TurnRole::Assistant, reply_text);
        self.state.turn_count += 1;
        if self.state.turn_count >= conversation_const::MAX_TURN_COUNT {
            self.state.dialogue_state = DialogueState::End;
            ConversationAction::CloseSession
        } else {
            self.state.dialogue_state = DialogueState::Listening;
            ConversationAction::ArmListening
        }
    }

    pub fn fatal_error(&mut self, message: impl Into<String>) -> ConversationAction {
        self.state.dialogue_state = DialogueState::Error;
        ConversationAction::EmitError(message.into())
    }

    pub fn error_absorbed(&mut self) -> ConversationAction {
        debug_assert_eq!(self.state.dialogue_state, DialogueState::Error);
        self.state.dialogue_state = DialogueState::End;
        ConversationAction::CloseSession
    }
}

impl Default for ConversationFsm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_greeting_to_listening() {
        let mut fsm = ConversationFsm::new();
        assert!(matches!(fsm.session_opened(), ConversationAction::PlayGreeting));
        assert_eq!(fsm.dialogue_state(), DialogueState::Greeting);
        assert!(matches!(
            fsm.greeting_dispatched(),
            ConversationAction::ArmListening
        ));
        assert_eq!(fsm.dialogue_state(), DialogueState::Listening);
    }

    #[test]
    fn accepted_text_moves_to_responding_and_records_history() {
        let mut fsm = ConversationFsm::new();
        fsm.session_opened();
        fsm.greeting_dispatched();
        fsm.turn_end_received();
        let action = fsm.asr_processed(ProcessingOutcome::Accepted {
            text: "book a loan".into(),
        });
        assert!(matches!(action, ConversationAction::CallLlmAndRespond { .. }));
        assert_eq!(fsm.dialogue_state(), DialogueState::Responding);
        assert_eq!(fsm.state.history.len(), 1);
    }

    #[test]
    fn incomplete_text_returns_to_listening_via_waiting_incomplete() {
        let mut fsm = ConversationFsm::new();
        fsm.session_opened();
        fsm.greeting_dispatched();
        fsm.turn_end_received();
        let action = fsm.asr_processed(ProcessingOutcome::Incomplete);
        assert!(matches!(action, ConversationAction::EnterWaitingIncomplete));
        assert_eq!(fsm.dialogue_state(), DialogueState::Listening);
    }

    #[test]
    fn three_consecutive_rejections_escalate_to_error() {
        let mut fsm = ConversationFsm::new();
        fsm.session_opened();
        fsm.greeting_dispatched();

        for _ in 0..conversation_const::MAX_CLARIFICATIONS {
            fsm.turn_end_received();
            let action = fsm.asr_processed(ProcessingOutcome::Rejected);
            assert!(matches!(action, ConversationAction::AskToRepeat));
            assert_eq!(fsm.dialogue_state(), DialogueState::Clarifying);
            fsm.state.dialogue_state = DialogueState::Listening;
        }

        fsm.turn_end_received();
        let action = fsm.asr_processed(ProcessingOutcome::Rejected);
        assert!(matches!(action, ConversationAction::Escalate));
        assert_eq!(fsm.dialogue_state(), DialogueState::Error);
    }

    #[test]
    fn max_turn_count_closes_session() {
        let mut fsm = ConversationFsm::new();
        fsm.state.dialogue_state = DialogueState::Responding;
        fsm.state.turn_count = conversation_const::MAX_TURN_COUNT - 1;
        let action = fsm.tts_dispatched("goodbye".into());
        assert!(matches!(action, ConversationAction::CloseSession));
        assert_eq!(fsm.dialogue_state(), DialogueState::End);
    }
}
