//! Per-session actor (§5): one session is one logically sequential actor.
//!
//! The actor loop drains inbound audio/control messages, runs C1/C2/C3
//! synchronously (VAD and the state machines never suspend), and off-loads
//! the ASR/LLM/TTS calls — the only permitted suspension points — onto
//! spawned tasks so inbound chunks keep draining (and barge-in keeps being
//! checked) while an adapter call is in flight. Only one adapter call is
//! ever in flight per session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine as _;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;

use voice_agent_config::{SessionConfig, TurnTimingConfig};
use voice_agent_core::audio::{AudioChunk, SampleRate};
use voice_agent_core::conversation::DialogueState;
use voice_agent_core::turn::TurnEvent;
use voice_agent_core::{
    AsrResult, LanguageModel, LlmMessage, Result, ServerMessage, SessionId, SessionStore,
    SpeechToText, TextToSpeech, TtsResult,
};
use voice_agent_pipeline::barge_in::BargeInOutcome;
use voice_agent_pipeline::vad::VadEvaluator;
use voice_agent_pipeline::{BargeInDetector, TurnTakingEngine};

use crate::completeness::{CompletenessGate, CompletenessVerdict};
use crate::conversation_fsm::{ConversationAction, ConversationFsm, ProcessingOutcome};
use crate::router;

const GREETING_TEXT: &str = "Hi, how can I help you today?";
const CLARIFY_TEXT: &str = "Sorry, could you say that again?";
const ESCALATION_TEXT: &str = "I'm having trouble understanding. Let me transfer you to an agent.";

/// Inbound events the actor consumes from the transport layer.
pub enum SessionInput {
    AudioChunk(Vec<u8>),
    Close,
}

/// The ASR/LLM/TTS collaborators for one session (§6 adapter contracts).
#[derive(Clone)]
pub struct SessionAdapters {
    pub asr: Arc<dyn SpeechToText>,
    pub llm: Arc<dyn LanguageModel>,
    pub tts: Arc<dyn TextToSpeech>,
}

/// Which reply a synthesised-audio step belongs to, so `Step::TtsDone` knows
/// what to do once it lands.
enum TtsKind {
    Greeting,
    Reply { text: String },
    Clarify,
    Escalation,
}

/// Result of whichever adapter call is currently in flight.
enum Step {
    AsrDone(Result<AsrResult>),
    CompletenessDone {
        text: String,
        confidence: f32,
        verdict: Result<CompletenessVerdict>,
    },
    LlmDone(Result<String>),
    TtsDone {
        kind: TtsKind,
        result: Result<TtsResult>,
    },
}

/// Registry of live actors' inboxes, keyed by session id, so the transport
/// layer can route an inbound websocket frame without knowing actor
/// internals. Distinct from `SessionStore`'s persisted `sessions:active` set
/// (§6) — this is purely in-process routing.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    actors: Arc<DashMap<SessionId, mpsc::Sender<SessionInput>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: SessionId, inbox: mpsc::Sender<SessionInput>) {
        self.actors.insert(id, inbox);
    }

    pub fn unregister(&self, id: SessionId) {
        self.actors.remove(&id);
    }

    pub fn get(&self, id: SessionId) -> Option<mpsc::Sender<SessionInput>> {
        self.actors.get(&id).map(|entry| entry.clone())
    }
}

/// One session's event loop (§5).
pub struct SessionActor {
    id: SessionId,
    inbox: mpsc::Receiver<SessionInput>,
    outbox: mpsc::Sender<ServerMessage>,
    turn_taking: TurnTakingEngine,
    barge_in: BargeInDetector,
    conversation: ConversationFsm,
    completeness: CompletenessGate,
    adapters: SessionAdapters,
    store: Arc<dyn SessionStore>,
    session_config: SessionConfig,
    pending: Option<JoinHandle<Step>>,
    created_at: Instant,
    last_activity: Instant,
    should_close: bool,
}

impl SessionActor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SessionId,
        inbox: mpsc::Receiver<SessionInput>,
        outbox: mpsc::Sender<ServerMessage>,
        adapters: SessionAdapters,
        store: Arc<dyn SessionStore>,
        timing: TurnTimingConfig,
        session_config: SessionConfig,
    ) -> Self {
        let vad = Arc::new(VadEvaluator::new());
        let turn_taking =
            TurnTakingEngine::new(vad.clone(), timing, SampleRate::Hz16000);
        let barge_in = BargeInDetector::new(vad, turn_taking.shared_state());
        let completeness = CompletenessGate::new(adapters.llm.clone());
        let now = Instant::now();
        Self {
            id,
            inbox,
            outbox,
            turn_taking,
            barge_in,
            conversation: ConversationFsm::new(),
            completeness,
            adapters,
            store,
            session_config,
            pending: None,
            created_at: now,
            last_activity: now,
            should_close: false,
        }
    }

    /// Spawns the actor onto the runtime, registering its inbox in
    /// `registry` so inbound transport frames can find it.
    pub fn spawn(
        id: SessionId,
        adapters: SessionAdapters,
        store: Arc<dyn SessionStore>,
        timing: TurnTimingConfig,
        session_config: SessionConfig,
        registry: SessionRegistry,
    ) -> mpsc::Receiver<ServerMessage> {
        let (input_tx, input_rx) = mpsc::channel(64);
        let (output_tx, output_rx) = mpsc::channel(64);
        registry.register(id, input_tx);
        let actor = SessionActor::new(
            id,
            input_rx,
            output_tx,
            adapters,
            store,
            timing,
            session_config,
        );
        tokio::spawn(async move {
            actor.run().await;
            registry.unregister(id);
        });
        output_rx
    }

    pub async fn run(mut self) {
        let _ = self.store.mark_active(self.id).await;
        let action = self.conversation.session_opened();
        self.apply_action(action).await;

        let mut ticker = interval(Duration::from_millis(20));
        loop {
            if self.should_close {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    self.handle_tick().await;
                }
                maybe_input = self.inbox.recv() => {
                    match maybe_input {
                        Some(SessionInput::AudioChunk(pcm)) => self.handle_audio(pcm).await,
                        Some(SessionInput::Close) | None => break,
                    }
                }
                step = Self::poll_pending(&mut self.pending) => {
                    self.pending = None;
                    match step {
                        Ok(step) => self.on_step(step).await,
                        Err(_join_err) => self.fatal("adapter task panicked").await,
                    }
                }
            }
        }

        let _ = self.store.mark_inactive(self.id).await;
    }

    async fn poll_pending(
        pending: &mut Option<JoinHandle<Step>>,
    ) -> std::result::Result<Step, tokio::task::JoinError> {
        match pending {
            Some(handle) => handle.await,
            None => std::future::pending().await,
        }
    }

    async fn handle_tick(&mut self) {
        let now = Instant::now();
        if now.duration_since(self.created_at)
            >= Duration::from_secs(self.session_config.max_session_duration_secs)
        {
            let _ = self
                .outbox
                .send(ServerMessage::Error {
                    code: "session_expired".into(),
                    message: "maximum session duration reached".into(),
                })
                .await;
            self.should_close = true;
            return;
        }
        if self.pending.is_none()
            && now.duration_since(self.last_activity)
                >= Duration::from_secs(self.session_config.idle_timeout_secs)
        {
            self.should_close = true;
            return;
        }

        self.barge_in.expire(now);

        if self.conversation.dialogue_state() == DialogueState::Listening {
            let events = self.turn_taking.on_tick(now);
            self.handle_turn_events(events).await;
        }
    }

    async fn handle_audio(&mut self, pcm: Vec<u8>) {
        self.last_activity = Instant::now();
        let now = self.last_activity;
        let chunk = AudioChunk::from_pcm16(&pcm, SampleRate::Hz16000, 0);
        self.barge_in.expire(now);

        // Checked unconditionally: `bot_speaking` and `dialogue_state ==
        // Listening` both flip true at essentially the same instant (§4.4
        // RESPONDING/greeting/clarify all re-arm LISTENING right after TTS
        // dispatch), so gating this behind dialogue state would make
        // barge-in unreachable during actual playback.
        if self.barge_in.on_chunk(&chunk) == BargeInOutcome::Preempt {
            self.handle_barge_in().await;
        }

        if self.conversation.dialogue_state() == DialogueState::Listening {
            let events = self.turn_taking.on_chunk(&chunk, now);
            self.handle_turn_events(events).await;
        }
    }

    async fn handle_barge_in(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        let _ = self.outbox.send(ServerMessage::BargeIn).await;
        self.conversation.state.dialogue_state = DialogueState::Listening;
    }

    async fn handle_turn_events(&mut self, events: Vec<TurnEvent>) {
        for event in events {
            match event {
                TurnEvent::TurnEnd { pcm } => {
                    let action = self.conversation.turn_end_received();
                    debug_assert!(matches!(action, ConversationAction::InvokeAsr));
                    self.spawn_asr(pcm);
                }
                TurnEvent::Nudge => {
                    self.conversation.state.silence_prompts += 1;
                    let _ = self
                        .outbox
                        .send(ServerMessage::Nudge {
                            text: "Are you still there?".into(),
                        })
                        .await;
                }
                TurnEvent::ContinuationCue => {
                    self.conversation.state.silence_prompts += 1;
                    let _ = self
                        .outbox
                        .send(ServerMessage::ContinuationCue {
                            text: "Go on, I'm listening.".into(),
                        })
                        .await;
                }
                TurnEvent::Comfort => {
                    self.conversation.state.silence_prompts += 1;
                    let _ = self
                        .outbox
                        .send(ServerMessage::Comfort {
                            text: "Take your time.".into(),
                        })
                        .await;
                }
            }
        }
    }

    fn spawn_asr(&mut self, pcm: Vec<u8>) {
        let asr = self.adapters.asr.clone();
        self.pending = Some(tokio::spawn(async move {
            let result = asr.transcribe(&pcm, false).await;
            Step::AsrDone(result)
        }));
    }

    fn spawn_llm(&mut self, text: String) {
        let llm = self.adapters.llm.clone();
        let history: Vec<LlmMessage> = self
            .conversation
            .state
            .history
            .iter()
            .map(|turn| match turn.role {
                voice_agent_core::TurnRole::User => LlmMessage::user(turn.content.clone()),
                voice_agent_core::TurnRole::Assistant => {
                    LlmMessage::assistant(turn.content.clone())
                }
            })
            .collect();
        self.pending = Some(tokio::spawn(async move {
            let mut messages = history;
            messages.push(LlmMessage::user(text));
            let result = llm.reply(&messages).await;
            Step::LlmDone(result)
        }));
    }

    fn spawn_tts(&mut self, kind_text: String, kind: fn(String) -> TtsKind) {
        let tts = self.adapters.tts.clone();
        let text_for_kind = kind_text.clone();
        self.pending = Some(tokio::spawn(async move {
            let result = tts.synthesize(&kind_text).await;
            Step::TtsDone {
                kind: kind(text_for_kind),
                result,
            }
        }));
    }

    async fn on_step(&mut self, step: Step) {
        match step {
            Step::AsrDone(result) => self.on_asr_done(result).await,
            Step::CompletenessDone {
                text,
                confidence,
                verdict,
            } => self.on_completeness_done(text, confidence, verdict).await,
            Step::LlmDone(result) => self.on_llm_done(result).await,
            Step::TtsDone { kind, result } => self.on_tts_done(kind, result).await,
        }
    }

    async fn on_asr_done(&mut self, result: Result<AsrResult>) {
        let asr = match result {
            Ok(asr) => asr,
            Err(err) => {
                self.fatal(err.to_string()).await;
                return;
            }
        };
        if asr.text.trim().is_empty() {
            let action = self.conversation.asr_processed(ProcessingOutcome::EmptyText);
            self.apply_action(action).await;
            return;
        }

        let gate = self.completeness.clone();
        let text = asr.text;
        let confidence = asr.confidence;
        self.pending = Some(tokio::spawn(async move {
            let verdict = gate.classify(&text).await;
            Step::CompletenessDone {
                text,
                confidence,
                verdict,
            }
        }));
    }

    async fn on_completeness_done(
        &mut self,
        text: String,
        confidence: f32,
        verdict: Result<CompletenessVerdict>,
    ) {
        let verdict = match verdict {
            Ok(v) => v,
            Err(err) => {
                self.fatal(err.to_string()).await;
                return;
            }
        };
        if verdict == CompletenessVerdict::Incomplete {
            self.conversation.state.pending_prefix.push_str(&text);
            self.conversation.state.pending_prefix.push(' ');
            let action = self.conversation.asr_processed(ProcessingOutcome::Incomplete);
            self.apply_action(action).await;
            return;
        }

        let full_text = format!("{}{}", self.conversation.state.pending_prefix, text);
        self.conversation.state.pending_prefix.clear();

        let routed = router::route(&full_text, confidence);
        let quality = router::classify_input_quality(&full_text, routed);
        tracing::debug!(session_id = %self.id, ?quality, "input quality classified");
        if !routed.passes_through() {
            let action = self.conversation.asr_processed(ProcessingOutcome::Rejected);
            self.apply_action(action).await;
            return;
        }

        let _ = self
            .outbox
            .send(ServerMessage::Transcription {
                text: full_text.clone(),
                confidence,
            })
            .await;
        let action = self
            .conversation
            .asr_processed(ProcessingOutcome::Accepted { text: full_text });
        self.apply_action(action).await;
    }

    async fn on_llm_done(&mut self, result: Result<String>) {
        match result {
            Ok(reply) => self.spawn_tts(reply.clone(), |text| TtsKind::Reply { text }),
            Err(err) => self.fatal(err.to_string()).await,
        }
    }

    async fn on_tts_done(&mut self, kind: TtsKind, result: Result<TtsResult>) {
        let tts = match result {
            Ok(tts) => tts,
            Err(err) => {
                self.fatal(err.to_string()).await;
                return;
            }
        };
        let audio = base64::engine::general_purpose::STANDARD.encode(&tts.audio_bytes);
        self.barge_in
            .start_playback(Instant::now() + Duration::from_secs_f32(tts.duration_sec.max(0.0)));

        match kind {
            TtsKind::Greeting => {
                self.send_response(GREETING_TEXT.to_string(), audio).await;
                let action = self.conversation.greeting_dispatched();
                self.apply_action(action).await;
            }
            TtsKind::Reply { text } => {
                self.send_response(text.clone(), audio).await;
                let action = self.conversation.tts_dispatched(text);
                self.apply_action(action).await;
            }
            TtsKind::Clarify => {
                self.send_response(CLARIFY_TEXT.to_string(), audio).await;
                // §4.4: CLARIFYING has no dedicated "resume listening"
                // transition of its own; asking-to-repeat just re-arms
                // LISTENING the same way ArmListening does elsewhere.
                self.conversation.state.dialogue_state = DialogueState::Listening;
            }
            TtsKind::Escalation => {
                self.send_response(ESCALATION_TEXT.to_string(), audio).await;
                let action = self.conversation.error_absorbed();
                debug_assert!(matches!(action, ConversationAction::CloseSession));
                self.should_close = true;
            }
        }
        self.persist_conversation().await;
    }

    async fn send_response(&mut self, text: String, audio: String) {
        let conversation_state = format!("{:?}", self.conversation.dialogue_state());
        let _ = self
            .outbox
            .send(ServerMessage::Response {
                text,
                audio,
                conversation_state,
            })
            .await;
    }

    async fn apply_action(&mut self, action: ConversationAction) {
        match action {
            ConversationAction::PlayGreeting => {
                self.spawn_tts(GREETING_TEXT.to_string(), |_| TtsKind::Greeting)
            }
            ConversationAction::ArmListening => {}
            ConversationAction::InvokeAsr => {
                // Carries no payload; handled directly where `TurnEnd` fires.
            }
            ConversationAction::EnterWaitingIncomplete => {
                self.turn_taking.enter_waiting_incomplete(Instant::now());
            }
            ConversationAction::AskToRepeat => {
                self.spawn_tts(CLARIFY_TEXT.to_string(), |_| TtsKind::Clarify)
            }
            ConversationAction::CallLlmAndRespond { text } => self.spawn_llm(text),
            ConversationAction::Escalate => {
                self.spawn_tts(ESCALATION_TEXT.to_string(), |_| TtsKind::Escalation)
            }
            ConversationAction::CloseSession => self.should_close = true,
            ConversationAction::EmitError(message) => {
                let _ = self
                    .outbox
                    .send(ServerMessage::Error {
                        code: "internal".into(),
                        message,
                    })
                    .await;
                let next = self.conversation.error_absorbed();
                debug_assert!(matches!(next, ConversationAction::CloseSession));
                self.should_close = true;
            }
            ConversationAction::None => {}
        }
        self.persist_conversation().await;
    }

    async fn fatal(&mut self, message: impl Into<String>) {
        let action = self.conversation.fatal_error(message.into());
        self.apply_action(action).await;
    }

    async fn persist_conversation(&self) {
        let ttl = Duration::from_secs(self.session_config.store_ttl_secs());
        let _ = self
            .store
            .put_conversation(self.id, &self.conversation.state, ttl)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use tokio::time::timeout;

    use voice_agent_core::conversation::ConversationState;
    use voice_agent_core::traits::SessionRecord;

    struct FixedAsr {
        text: String,
        confidence: f32,
    }

    #[async_trait]
    impl SpeechToText for FixedAsr {
        async fn transcribe(&self, _pcm: &[u8], _use_vad_filter: bool) -> Result<AsrResult> {
            Ok(AsrResult {
                text: self.text.clone(),
                confidence: self.confidence,
                language: Some("en".into()),
            })
        }

        fn model_name(&self) -> &str {
            "fixed-asr"
        }
    }

    /// Returns successive texts from a fixed list, one per call, so a test
    /// can drive a `WAITING_INCOMPLETE` continuation followed by a
    /// completing turn.
    struct SequencedAsr {
        texts: StdMutex<std::vec::IntoIter<&'static str>>,
        confidence: f32,
    }

    impl SequencedAsr {
        fn new(texts: &[&'static str], confidence: f32) -> Self {
            Self {
                texts: StdMutex::new(texts.to_vec().into_iter()),
                confidence,
            }
        }
    }

    #[async_trait]
    impl SpeechToText for SequencedAsr {
        async fn transcribe(&self, _pcm: &[u8], _use_vad_filter: bool) -> Result<AsrResult> {
            let text = self
                .texts
                .lock()
                .unwrap()
                .next()
                .expect("test drove more turns than texts were queued")
                .to_string();
            Ok(AsrResult {
                text,
                confidence: self.confidence,
                language: Some("en".into()),
            })
        }

        fn model_name(&self) -> &str {
            "sequenced-asr"
        }
    }

    struct FixedLlm {
        reply: String,
    }

    #[async_trait]
    impl LanguageModel for FixedLlm {
        async fn reply(&self, _messages: &[LlmMessage]) -> Result<String> {
            Ok(self.reply.clone())
        }

        fn model_name(&self) -> &str {
            "fixed-llm"
        }
    }

    struct SilentTts;

    #[async_trait]
    impl TextToSpeech for SilentTts {
        async fn synthesize(&self, _text: &str) -> Result<TtsResult> {
            Ok(TtsResult {
                audio_bytes: Vec::new(),
                duration_sec: 0.0,
            })
        }

        fn model_name(&self) -> &str {
            "silent-tts"
        }
    }

    /// Minimal in-process store: the actor only ever calls `mark_active`,
    /// `mark_inactive`, and `put_conversation`/`get_conversation` during a
    /// run, never the session-record methods.
    #[derive(Default)]
    struct TestStore {
        conversations: StdMutex<HashMap<SessionId, ConversationState>>,
    }

    #[async_trait]
    impl SessionStore for TestStore {
        async fn put_session(
            &self,
            _id: SessionId,
            _record: &SessionRecord,
            _ttl: Duration,
        ) -> Result<()> {
            Ok(())
        }

        async fn get_session(&self, _id: SessionId) -> Result<Option<SessionRecord>> {
            Ok(None)
        }

        async fn delete_session(&self, _id: SessionId) -> Result<()> {
            Ok(())
        }

        async fn mark_active(&self, _id: SessionId) -> Result<()> {
            Ok(())
        }

        async fn mark_inactive(&self, _id: SessionId) -> Result<()> {
            Ok(())
        }

        async fn active_sessions(&self) -> Result<Vec<SessionId>> {
            Ok(Vec::new())
        }

        async fn put_conversation(
            &self,
            id: SessionId,
            state: &ConversationState,
            _ttl: Duration,
        ) -> Result<()> {
            self.conversations.lock().unwrap().insert(id, state.clone());
            Ok(())
        }

        async fn get_conversation(&self, id: SessionId) -> Result<Option<ConversationState>> {
            Ok(self.conversations.lock().unwrap().get(&id).cloned())
        }
    }

    /// Millisecond thresholds small enough that real wall-clock execution
    /// crosses them within a couple of the actor's 20ms ticks, without
    /// needing to fake `Instant::now()`.
    fn fast_timing() -> TurnTimingConfig {
        TurnTimingConfig {
            candidate_end_ms: 5,
            final_end_ms: 5,
            min_speech_ms: 1,
            nudge_ms: 10_000,
            incomplete_wait_ms: 10_000,
            comfort_wait_ms: 20_000,
        }
    }

    fn loud_chunk() -> Vec<u8> {
        std::iter::repeat(i16::MAX.to_le_bytes())
            .take(320 * 20)
            .flatten()
            .collect()
    }

    fn silent_chunk() -> Vec<u8> {
        vec![0u8; 320 * 4 * 2]
    }

    async fn next_response(outbox: &mut mpsc::Receiver<ServerMessage>) -> ServerMessage {
        timeout(Duration::from_secs(5), outbox.recv())
            .await
            .expect("timed out waiting for a server message")
            .expect("actor closed its outbox unexpectedly")
    }

    /// §8 scenario 1, "clean single turn": greeting, one clear utterance,
    /// silence, transcription accepted, reply synthesised and sent back.
    #[tokio::test(flavor = "multi_thread")]
    async fn clean_single_turn_produces_transcription_and_response() {
        let adapters = SessionAdapters {
            asr: Arc::new(FixedAsr {
                text: "turn on the lights".into(),
                confidence: 0.95,
            }),
            llm: Arc::new(FixedLlm {
                reply: "Sure, turning them on.".into(),
            }),
            tts: Arc::new(SilentTts),
        };
        let store: Arc<dyn SessionStore> = Arc::new(TestStore::default());
        let registry = SessionRegistry::new();
        let id = SessionId::new();

        let mut outbox = SessionActor::spawn(
            id,
            adapters,
            store,
            fast_timing(),
            SessionConfig::default(),
            registry.clone(),
        );
        let inbox = registry.get(id).expect("spawn registers the inbox");

        let greeting = next_response(&mut outbox).await;
        assert!(matches!(greeting, ServerMessage::Response { .. }));

        // Let the greeting's `TtsDone` handler finish arming LISTENING
        // before any audio is sent.
        tokio::time::sleep(Duration::from_millis(50)).await;

        inbox
            .send(SessionInput::AudioChunk(loud_chunk()))
            .await
            .expect("actor still running");
        inbox
            .send(SessionInput::AudioChunk(silent_chunk()))
            .await
            .expect("actor still running");

        let transcription = next_response(&mut outbox).await;
        match transcription {
            ServerMessage::Transcription { text, confidence } => {
                assert_eq!(text, "turn on the lights");
                assert!((confidence - 0.95).abs() < 1e-6);
            }
            other => panic!("expected Transcription, got {other:?}"),
        }

        let reply = next_response(&mut outbox).await;
        match reply {
            ServerMessage::Response { text, .. } => {
                assert_eq!(text, "Sure, turning them on.");
            }
            other => panic!("expected Response, got {other:?}"),
        }

        inbox
            .send(SessionInput::Close)
            .await
            .expect("actor still running");
    }

    /// §8 scenario 3: an incomplete utterance's transcript is retained and
    /// concatenated onto the continuation's transcript before routing.
    #[tokio::test(flavor = "multi_thread")]
    async fn incomplete_turn_concatenates_with_its_continuation() {
        let adapters = SessionAdapters {
            asr: Arc::new(SequencedAsr::new(&["I want to", "book a flight"], 0.9)),
            llm: Arc::new(FixedLlm {
                reply: "Booking your flight.".into(),
            }),
            tts: Arc::new(SilentTts),
        };
        let store: Arc<dyn SessionStore> = Arc::new(TestStore::default());
        let registry = SessionRegistry::new();
        let id = SessionId::new();

        let mut outbox = SessionActor::spawn(
            id,
            adapters,
            store,
            fast_timing(),
            SessionConfig::default(),
            registry.clone(),
        );
        let inbox = registry.get(id).expect("spawn registers the inbox");

        let greeting = next_response(&mut outbox).await;
        assert!(matches!(greeting, ServerMessage::Response { .. }));
        tokio::time::sleep(Duration::from_millis(50)).await;

        // First turn: "I want to" is ruled linguistically incomplete, so no
        // transcription/response is sent for it, only WAITING_INCOMPLETE.
        inbox
            .send(SessionInput::AudioChunk(loud_chunk()))
            .await
            .expect("actor still running");
        inbox
            .send(SessionInput::AudioChunk(silent_chunk()))
            .await
            .expect("actor still running");

        // Give the incomplete turn time to round-trip through ASR and the
        // completeness gate before the continuation's audio arrives.
        tokio::time::sleep(Duration::from_millis(100)).await;

        inbox
            .send(SessionInput::AudioChunk(loud_chunk()))
            .await
            .expect("actor still running");
        inbox
            .send(SessionInput::AudioChunk(silent_chunk()))
            .await
            .expect("actor still running");

        let transcription = next_response(&mut outbox).await;
        match transcription {
            ServerMessage::Transcription { text, .. } => {
                assert_eq!(text, "I want to book a flight");
            }
            other => panic!("expected Transcription, got {other:?}"),
        }

        let reply = next_response(&mut outbox).await;
        match reply {
            ServerMessage::Response { text, .. } => {
                assert_eq!(text, "Booking your flight.");
            }
            other => panic!("expected Response, got {other:?}"),
        }

        inbox
            .send(SessionInput::Close)
            .await
            .expect("actor still running");
    }
}
