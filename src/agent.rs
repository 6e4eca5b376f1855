//! The bounded tool-calling loop.
//!
//! [`Orchestrator::run_turn`] takes one user message through the protocol:
//! ask the provider, run whatever tools it requests, feed the results back
//! and ask again, until it answers or [`MAX_TURN_ITERATIONS`] round-trips
//! have been spent. Every message exchanged is appended to the
//! [`Conversation`], so the next turn sees the full history.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_PROVIDER_TIMEOUT_SECS, MAX_TURN_ITERATIONS};
use crate::conversation::Conversation;
use crate::message::{Message, ToolCallRequest};
use crate::output::TurnSink;
use crate::provider::{ChatProvider, ProviderError, ProviderReply};
use crate::tools::ToolRegistry;

/// Where a turn currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingProvider,
    ToolsRequested,
    FinalAnswer,
    Aborted,
}

impl LoopState {
    fn can_move_to(self, next: LoopState) -> bool {
        use LoopState::*;
        matches!(
            (self, next),
            (AwaitingProvider, ToolsRequested | FinalAnswer | Aborted)
                | (ToolsRequested, AwaitingProvider)
        )
    }

    fn is_terminal(self) -> bool {
        matches!(self, LoopState::FinalAnswer | LoopState::Aborted)
    }
}

/// How a turn ended.
#[derive(Debug)]
pub enum TurnOutcome {
    FinalAnswer(String),
    /// The provider could not be reached or answered with garbage.
    Aborted(ProviderError),
    /// The provider kept requesting tools for every allowed round-trip.
    TurnLimitExceeded { iterations: usize },
}

impl TurnOutcome {
    pub fn is_final_answer(&self) -> bool {
        matches!(self, TurnOutcome::FinalAnswer(_))
    }
}

/// Drives turns against one provider with one set of tools.
pub struct Orchestrator {
    provider: Box<dyn ChatProvider>,
    tools: ToolRegistry,
    provider_timeout: Duration,
}

impl Orchestrator {
    pub fn new(provider: impl ChatProvider + 'static, tools: ToolRegistry) -> Self {
        Self {
            provider: Box::new(provider),
            tools,
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
        }
    }

    /// Deadline for a single provider round-trip.
    pub fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Runs one user turn to completion.
    ///
    /// Output chunks reach `sink` as they are produced. A provider failure
    /// leaves the conversation holding the user message and whatever tool
    /// exchanges already completed, never a partial assistant message.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        user_text: &str,
        sink: &mut dyn TurnSink,
    ) -> TurnOutcome {
        conversation.push(Message::user(user_text));
        let mut state = LoopState::AwaitingProvider;

        for iteration in 1..=MAX_TURN_ITERATIONS {
            debug!(
                conversation = conversation.short_id(),
                iteration,
                messages = conversation.len(),
                "awaiting provider"
            );

            let reply = match self.complete(conversation).await {
                Ok(reply) => reply,
                Err(err) => {
                    advance(&mut state, LoopState::Aborted);
                    warn!(conversation = conversation.short_id(), %err, "turn aborted");
                    sink.on_error(&format!("Provider Error: {err}"));
                    return TurnOutcome::Aborted(err);
                }
            };

            match reply {
                ProviderReply::Final(text) => {
                    advance(&mut state, LoopState::FinalAnswer);
                    conversation.push(Message::assistant(text.as_str()));
                    sink.on_answer(&text);
                    return TurnOutcome::FinalAnswer(text);
                }
                ProviderReply::ToolCalls { content, calls } => {
                    advance(&mut state, LoopState::ToolsRequested);
                    conversation.push(Message::assistant_tool_calls(content, calls.clone()));
                    self.run_tools(conversation, &calls, sink).await;
                    advance(&mut state, LoopState::AwaitingProvider);
                }
            }
        }

        warn!(
            conversation = conversation.short_id(),
            iterations = MAX_TURN_ITERATIONS,
            "turn limit exceeded without a final answer"
        );
        sink.on_error(&format!(
            "Turn limit exceeded: no final answer after {MAX_TURN_ITERATIONS} provider round-trips"
        ));
        TurnOutcome::TurnLimitExceeded {
            iterations: MAX_TURN_ITERATIONS,
        }
    }

    async fn complete(&self, conversation: &Conversation) -> Result<ProviderReply, ProviderError> {
        let call = self
            .provider
            .complete(conversation.messages(), self.tools.descriptors());
        match tokio::time::timeout(self.provider_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.provider_timeout)),
        }
    }

    /// Tool calls run one at a time, in the order the provider listed them.
    async fn run_tools(
        &self,
        conversation: &mut Conversation,
        calls: &[ToolCallRequest],
        sink: &mut dyn TurnSink,
    ) {
        info!(
            conversation = conversation.short_id(),
            count = calls.len(),
            "provider requested tools"
        );
        for call in calls {
            sink.on_tool_call(call.name());
            let result = self.tools.dispatch(call.name(), call.raw_arguments()).await;
            conversation.push(Message::tool_result(call.id.as_str(), call.name(), result));
        }
    }
}

fn advance(state: &mut LoopState, next: LoopState) {
    debug_assert!(
        !state.is_terminal() && state.can_move_to(next),
        "invalid loop transition {state:?} -> {next:?}"
    );
    debug!(from = ?*state, to = ?next, "loop state");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::output::{EventLog, TurnEvent};
    use crate::schema::{ParamSpec, ToolSpec};
    use crate::tools::{Tool, ToolArgs, ToolError, ToolOutput};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type Scripted = Result<ProviderReply, ProviderError>;

    /// Replays canned replies and records every snapshot it was sent.
    #[derive(Clone, Default)]
    struct ScriptedProvider {
        replies: Arc<Mutex<VecDeque<Scripted>>>,
        snapshots: Arc<Mutex<Vec<Vec<Message>>>>,
        always_tools: bool,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Scripted>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into())),
                ..Self::default()
            }
        }

        fn always_tools() -> Self {
            Self {
                always_tools: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.snapshots.lock().unwrap().len()
        }

        fn snapshot(&self, index: usize) -> Vec<Message> {
            self.snapshots.lock().unwrap()[index].clone()
        }
    }

    #[async_trait::async_trait]
    impl ChatProvider for ScriptedProvider {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            messages: &[Message],
            _tools: &[crate::schema::ToolDescriptor],
        ) -> Result<ProviderReply, ProviderError> {
            let n = {
                let mut snapshots = self.snapshots.lock().unwrap();
                snapshots.push(messages.to_vec());
                snapshots.len()
            };
            if self.always_tools {
                return Ok(tool_calls(vec![call(&format!("call_{n}"), "toolA", "{}")]));
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Malformed("script exhausted".into())))
        }
    }

    struct SlowProvider;

    #[async_trait::async_trait]
    impl ChatProvider for SlowProvider {
        fn model(&self) -> &str {
            "slow"
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _tools: &[crate::schema::ToolDescriptor],
        ) -> Result<ProviderReply, ProviderError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ProviderReply::Final("too late".into()))
        }
    }

    /// Answers with a fixed string.
    struct NamedTool {
        name: &'static str,
        answer: &'static str,
    }

    #[async_trait::async_trait]
    impl Tool for NamedTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new(self.name).param(ParamSpec::optional("query", "str"))
        }

        async fn call(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
            Ok(self.answer.into())
        }
    }

    struct BrokenTool;

    #[async_trait::async_trait]
    impl Tool for BrokenTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new("broken")
        }

        async fn call(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
            Err(ToolError::Failed("backend down".into()))
        }
    }

    fn call(id: &str, name: &str, args: &str) -> ToolCallRequest {
        ToolCallRequest::new(id, name, args)
    }

    fn tool_calls(calls: Vec<ToolCallRequest>) -> ProviderReply {
        ProviderReply::ToolCalls {
            content: None,
            calls,
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::builder()
            .register(NamedTool {
                name: "toolA",
                answer: "result A",
            })
            .register(NamedTool {
                name: "toolB",
                answer: "result B",
            })
            .register(BrokenTool)
            .build()
    }

    fn orchestrator(provider: impl ChatProvider + 'static) -> Orchestrator {
        Orchestrator::new(provider, registry())
    }

    /// Every tool message answers a call of the nearest preceding assistant
    /// message that requested tools.
    fn assert_ids_correlate(messages: &[Message]) {
        let mut open: Vec<String> = Vec::new();
        for msg in messages {
            match msg.role {
                Role::Assistant if msg.requests_tools() => {
                    open = msg.tool_calls.iter().map(|c| c.id.clone()).collect();
                }
                Role::Tool => {
                    let id = msg.tool_call_id.clone().expect("tool message without id");
                    assert!(open.contains(&id), "orphan tool result {id}");
                }
                _ => open.clear(),
            }
        }
    }

    #[tokio::test]
    async fn plain_answer_round_trip() {
        let provider = ScriptedProvider::new(vec![Ok(ProviderReply::Final("pong".into()))]);
        let agent = orchestrator(provider.clone());
        let mut conversation = Conversation::new();
        let mut log = EventLog::new();

        let outcome = agent.run_turn(&mut conversation, "ping", &mut log).await;

        assert!(matches!(outcome, TurnOutcome::FinalAnswer(ref t) if t == "pong"));
        assert_eq!(log.events(), &[TurnEvent::Answer("pong".into())]);
        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(conversation.messages()[1].text(), "pong");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn tools_run_in_provider_order() {
        let provider = ScriptedProvider::new(vec![
            Ok(tool_calls(vec![
                call("id_a", "toolA", "{}"),
                call("id_b", "toolB", r#"{"query":"x"}"#),
            ])),
            Ok(ProviderReply::Final("combined".into())),
        ]);
        let agent = orchestrator(provider.clone());
        let mut conversation = Conversation::new();
        let mut log = EventLog::new();

        let outcome = agent.run_turn(&mut conversation, "do both", &mut log).await;
        assert!(outcome.is_final_answer());

        assert_eq!(
            log.events(),
            &[
                TurnEvent::ToolCall("toolA".into()),
                TurnEvent::ToolCall("toolB".into()),
                TurnEvent::Answer("combined".into()),
            ]
        );

        let messages = conversation.messages();
        assert_eq!(messages.len(), 5);
        assert!(messages[1].requests_tools());
        assert_eq!(messages[2].tool_call_id.as_deref(), Some("id_a"));
        assert_eq!(messages[2].text(), "result A");
        assert_eq!(messages[3].tool_call_id.as_deref(), Some("id_b"));
        assert_eq!(messages[3].name.as_deref(), Some("toolB"));
        assert_eq!(messages[4].text(), "combined");
        assert_ids_correlate(messages);

        // The second round-trip sees both results.
        assert_eq!(provider.snapshot(1).len(), 4);
    }

    #[tokio::test]
    async fn stops_after_turn_limit() {
        let provider = ScriptedProvider::always_tools();
        let agent = orchestrator(provider.clone());
        let mut conversation = Conversation::new();
        let mut log = EventLog::new();

        let outcome = agent.run_turn(&mut conversation, "loop forever", &mut log).await;

        assert!(matches!(
            outcome,
            TurnOutcome::TurnLimitExceeded { iterations: MAX_TURN_ITERATIONS }
        ));
        assert_eq!(provider.calls(), MAX_TURN_ITERATIONS);
        assert_eq!(log.tool_calls().len(), MAX_TURN_ITERATIONS);
        assert!(matches!(log.events().last(), Some(TurnEvent::Error(m)) if m.contains("Turn limit")));
        // user + (assistant + tool) per iteration
        assert_eq!(conversation.len(), 1 + 2 * MAX_TURN_ITERATIONS);
        assert_ids_correlate(conversation.messages());
    }

    #[tokio::test]
    async fn failing_tool_does_not_end_turn() {
        let provider = ScriptedProvider::new(vec![
            Ok(tool_calls(vec![call("c1", "broken", "{}")])),
            Ok(ProviderReply::Final("recovered".into())),
        ]);
        let agent = orchestrator(provider.clone());
        let mut conversation = Conversation::new();

        let outcome = agent
            .run_turn(&mut conversation, "try it", &mut EventLog::new())
            .await;

        assert!(matches!(outcome, TurnOutcome::FinalAnswer(ref t) if t == "recovered"));
        let result = &conversation.messages()[2];
        assert_eq!(result.role, Role::Tool);
        assert!(result.text().starts_with("Tool Error:"), "{}", result.text());
        assert!(result.text().contains("backend down"));
    }

    #[tokio::test]
    async fn unknown_tool_and_bad_arguments_are_fed_back() {
        let provider = ScriptedProvider::new(vec![
            Ok(tool_calls(vec![
                call("c1", "missing", "{}"),
                call("c2", "toolA", "{not json"),
            ])),
            Ok(ProviderReply::Final("ok".into())),
        ]);
        let agent = orchestrator(provider);
        let mut conversation = Conversation::new();

        agent
            .run_turn(&mut conversation, "hi", &mut EventLog::new())
            .await;

        let messages = conversation.messages();
        assert_eq!(messages[2].text(), "Error: Tool 'missing' not found.");
        assert_eq!(messages[3].text(), "result A");
    }

    #[tokio::test]
    async fn provider_failure_aborts_without_assistant_message() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::Status {
            status: 502,
            body: "bad gateway".into(),
        })]);
        let agent = orchestrator(provider.clone());
        let mut conversation = Conversation::new();
        let mut log = EventLog::new();

        let outcome = agent.run_turn(&mut conversation, "hello", &mut log).await;

        assert!(matches!(outcome, TurnOutcome::Aborted(ProviderError::Status { status: 502, .. })));
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::User);
        assert_eq!(log.events().len(), 1);
        assert!(matches!(&log.events()[0], TurnEvent::Error(m) if m.contains("bad gateway")));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn failure_after_tools_keeps_completed_exchanges() {
        let provider = ScriptedProvider::new(vec![
            Ok(tool_calls(vec![call("c1", "toolA", "{}")])),
            Err(ProviderError::Api("overloaded".into())),
        ]);
        let agent = orchestrator(provider);
        let mut conversation = Conversation::new();

        let outcome = agent
            .run_turn(&mut conversation, "q", &mut EventLog::new())
            .await;

        assert!(matches!(outcome, TurnOutcome::Aborted(_)));
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.last().map(|m| m.role), Some(Role::Tool));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let agent = orchestrator(SlowProvider).provider_timeout(Duration::from_millis(20));
        let mut conversation = Conversation::new();
        let mut log = EventLog::new();

        let outcome = agent.run_turn(&mut conversation, "hello", &mut log).await;

        assert!(matches!(outcome, TurnOutcome::Aborted(ProviderError::Timeout(_))));
        assert_eq!(conversation.len(), 1);
        assert!(matches!(&log.events()[0], TurnEvent::Error(_)));
    }

    #[tokio::test]
    async fn history_carries_into_next_turn() {
        let provider = ScriptedProvider::new(vec![
            Ok(ProviderReply::Final("first".into())),
            Ok(ProviderReply::Final("second".into())),
        ]);
        let agent = orchestrator(provider.clone());
        let mut conversation = Conversation::with_system_prompt(Some("be brief"));

        agent
            .run_turn(&mut conversation, "one", &mut EventLog::new())
            .await;
        agent
            .run_turn(&mut conversation, "two", &mut EventLog::new())
            .await;

        let second = provider.snapshot(1);
        let texts: Vec<&str> = second.iter().map(Message::text).collect();
        assert_eq!(texts, vec!["be brief", "one", "first", "two"]);
    }

    #[test]
    fn transitions() {
        use LoopState::*;
        assert!(AwaitingProvider.can_move_to(ToolsRequested));
        assert!(ToolsRequested.can_move_to(AwaitingProvider));
        assert!(!ToolsRequested.can_move_to(FinalAnswer));
        assert!(!FinalAnswer.can_move_to(AwaitingProvider));
        assert!(Aborted.is_terminal());
    }
}
