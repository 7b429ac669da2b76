use std::sync::Arc;

use serde::Serialize;
use skillgate_core::logging::{PrivacyConfig, redact_sensitive};
use skillgate_core::{AgentConfig, Error, Result, SessionId};
use skillgate_middleware::{ActivationInterceptor, Interception, ToolSurface, ToolSurfaceResolver, system_prompt};
use skillgate_providers::{ChatMessage, ChatRequest, Provider, ToolCall, ToolResult};
use skillgate_skills::{PermissionContext, SessionSkillState, SkillCatalog, activation_tool_name};
use skillgate_tools::{ToolDispatcher, ToolRegistry};
use tokio::sync::mpsc;

use crate::session_store::{SessionStore, SkillSession};

/// Events emitted while a turn runs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A model invocation is about to be made with these tools
    ModelRequest { iteration: usize, tools: Vec<String> },
    /// A skill was activated (or re-activated) by the model
    SkillActivated { skill_id: String, dropped: Vec<String>, active: Vec<String> },
    /// An activation was refused; the model saw a failed tool call
    ActivationRejected { skill_id: String },
    /// A pass-through call named a tool outside the current surface
    ToolBlocked { name: String },
    /// An ordinary tool ran
    ToolResult { name: String, success: bool, content: String },
    /// Final assistant text for the turn
    Reply { content: String },
    /// The turn stopped before the model produced a reply
    IterationLimit { limit: usize },
}

/// Why a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model answered without calling tools
    Completed,
    /// `max_iterations` model invocations were spent
    IterationLimit,
}

/// Summary of one user turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub stop: StopReason,
    /// Model invocations made during the turn
    pub iterations: usize,
    /// Skills the model activated during the turn, in order
    pub activated: Vec<String>,
    /// Active skills once the turn ended
    pub active: Vec<String>,
}

/// Turn orchestrator.
///
/// Resolves the tool surface before every model invocation, routes every tool
/// call through the activation interceptor first, and records activation
/// instructions and tool output in the session history before calling the
/// model again.
pub struct Agent {
    provider: Arc<dyn Provider>,
    interceptor: ActivationInterceptor,
    dispatcher: ToolDispatcher,
    sessions: Arc<SessionStore>,
    config: AgentConfig,
    privacy: PrivacyConfig,
    events: Option<mpsc::UnboundedSender<AgentEvent>>,
}

impl Agent {
    /// Create an orchestrator over a validated catalog and executor registry.
    ///
    /// With `require_executors` set, fails when any catalog tool has no
    /// executor in `registry`.
    pub fn new(
        provider: Arc<dyn Provider>, catalog: Arc<SkillCatalog>, registry: ToolRegistry, sessions: Arc<SessionStore>,
        config: AgentConfig,
    ) -> Result<Self> {
        let missing = registry.missing_executors(&catalog);
        if !missing.is_empty() {
            if config.require_executors {
                return Err(Error::Config(format!("catalog tools without executors: {}", missing.join(", "))));
            }
            tracing::warn!(tools = ?missing, "catalog tools without executors");
        }

        Ok(Self {
            provider,
            interceptor: ActivationInterceptor::new(ToolSurfaceResolver::new(catalog)),
            dispatcher: ToolDispatcher::new(registry),
            sessions,
            config,
            privacy: PrivacyConfig::default(),
            events: None,
        })
    }

    /// Set the privacy rules applied to logged tool output
    pub fn with_privacy(mut self, privacy: PrivacyConfig) -> Self {
        self.privacy = privacy;
        self
    }

    /// Stream [`AgentEvent`]s to `sender` as turns run
    pub fn with_event_sender(mut self, sender: mpsc::UnboundedSender<AgentEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn catalog(&self) -> &SkillCatalog {
        self.interceptor.resolver().catalog()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Current surface of a session, as the next model call would see it
    pub async fn surface(&self, session_id: &SessionId) -> Result<ToolSurface> {
        let handle = self.sessions.require(session_id).await?;
        let session = handle.lock().await;
        Ok(self.interceptor.resolver().resolve(&session.state, &session.permissions))
    }

    /// Activate a skill outside a model turn, under the same permission check
    /// the model's activation calls go through.
    ///
    /// A successful activation is recorded in the history as a `skill_<id>`
    /// call and its result, so the model sees the instructions on the next turn.
    pub async fn activate(&self, session_id: &SessionId, skill_id: &str) -> Result<Interception> {
        let handle = self.sessions.require(session_id).await?;
        let mut guard = handle.lock().await;
        let SkillSession { state, permissions, history, .. } = &mut *guard;

        let interception = self.interceptor.activate(state, permissions, skill_id);
        if let Interception::Activated(activation) = &interception {
            self.ensure_system_prompt(history, state, permissions);
            let call = ToolCall::new(
                format!("preload_{}", history.len()),
                activation_tool_name(&activation.skill_id),
                serde_json::json!({}),
            );
            let result = activation.to_tool_result(call.id.clone());
            history.push(ChatMessage::with_tool_calls("", vec![call]));
            history.push(result.into_message());
            tracing::info!(session = %session_id, skill = %activation.skill_id, "skill preloaded");
        }
        Ok(interception)
    }

    /// Drop a skill from a session; its tools leave the surface on the next
    /// model call. Returns whether the skill was active.
    pub async fn deactivate(&self, session_id: &SessionId, skill_id: &str) -> Result<bool> {
        let handle = self.sessions.require(session_id).await?;
        let mut guard = handle.lock().await;
        let removed = guard.state.deactivate(skill_id);
        if removed {
            tracing::info!(session = %session_id, skill = %skill_id, "skill deactivated");
        }
        Ok(removed)
    }

    fn ensure_system_prompt(
        &self,
        history: &mut Vec<ChatMessage>,
        state: &SessionSkillState,
        permissions: &PermissionContext,
    ) {
        if history.is_empty() {
            let prompt = system_prompt(self.catalog(), permissions, state.mode(), &self.config.custom_instructions);
            history.push(ChatMessage::system(prompt));
        }
    }

    /// Run one user turn to completion.
    ///
    /// Holds the session lock for the whole turn, so turns of one session never
    /// interleave. Provider failures abort the turn with `Err`; failed tool
    /// calls and refused activations are recorded as tool results instead.
    pub async fn run_turn(&self, session_id: &SessionId, input: &str) -> Result<TurnOutcome> {
        let handle = self.sessions.require(session_id).await?;
        let mut guard = handle.lock().await;
        let SkillSession { state, permissions, history, .. } = &mut *guard;

        self.ensure_system_prompt(history, state, permissions);
        history.push(ChatMessage::user(input));

        let resolver = self.interceptor.resolver();
        let mut activated = Vec::new();

        for iteration in 1..=self.config.max_iterations {
            let mut surface = resolver.resolve(state, permissions);
            let tools: Vec<String> = surface.names().into_iter().map(String::from).collect();
            tracing::debug!(session = %session_id, iteration, tools = ?tools, "invoking model");
            self.emit(AgentEvent::ModelRequest { iteration, tools });

            let request = ChatRequest::builder().messages(history.clone()).tools(surface.specs()).build();
            let response = self.provider.chat(request).await?;

            if !response.has_tool_calls() {
                let reply = response.message.content.clone();
                history.push(response.message);
                self.emit(AgentEvent::Reply { content: reply.clone() });
                return Ok(TurnOutcome {
                    reply,
                    stop: StopReason::Completed,
                    iterations: iteration,
                    activated,
                    active: state.active().to_vec(),
                });
            }
            let calls = response.tool_calls.unwrap_or_default();

            history.push(ChatMessage::with_tool_calls(response.message.content, calls.clone()));

            for call in &calls {
                let result = match self.interceptor.handle(state, permissions, call) {
                    Interception::Activated(activation) => {
                        self.emit(AgentEvent::SkillActivated {
                            skill_id: activation.skill_id.clone(),
                            dropped: activation.transition.dropped().to_vec(),
                            active: activation.active.clone(),
                        });
                        activated.push(activation.skill_id.clone());
                        let result = activation.to_tool_result(call.id.clone());
                        surface = activation.surface;
                        result
                    }
                    Interception::Rejected(rejection) => {
                        self.emit(AgentEvent::ActivationRejected { skill_id: rejection.skill_id.clone() });
                        rejection.to_tool_result(call.id.clone())
                    }
                    Interception::PassThrough => self.execute(&surface, call),
                };

                tracing::debug!(
                    tool = %call.name(),
                    success = result.is_success(),
                    output = %redact_sensitive(&result.as_message_content(), &self.privacy),
                    "tool call recorded"
                );
                history.push(result.into_message());
            }
        }

        let limit = self.config.max_iterations;
        tracing::warn!(session = %session_id, limit, "turn stopped at iteration limit");
        self.emit(AgentEvent::IterationLimit { limit });
        Ok(TurnOutcome {
            reply: String::new(),
            stop: StopReason::IterationLimit,
            iterations: limit,
            activated,
            active: state.active().to_vec(),
        })
    }

    /// Forward a pass-through call, refusing tools the model was not offered
    fn execute(&self, surface: &ToolSurface, call: &ToolCall) -> ToolResult {
        let name = call.name();
        if !surface.tool_names().contains(&name) {
            tracing::warn!(tool = %name, "call to tool outside the current surface");
            self.emit(AgentEvent::ToolBlocked { name: name.to_string() });
            return ToolResult::error(call.id.clone(), format!("Tool '{}' is not available in this session.", name));
        }

        if self.privacy.log_tool_args {
            tracing::trace!(tool = %name, args = %call.arguments(), "tool arguments");
        }

        let result = self.dispatcher.execute_or_error(call);
        self.emit(AgentEvent::ToolResult {
            name: name.to_string(),
            success: result.is_success(),
            content: result.as_message_content(),
        });
        result
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skillgate_providers::{MockProvider, MockResponse, Role, ToolParameter, ToolSpec};
    use skillgate_skills::{PermissionContext, Skill, Visibility};
    use skillgate_tools::{EchoTool, SayHelloTool, Tool};

    fn catalog() -> Arc<SkillCatalog> {
        let hello =
            Skill::new("hello_world", "Greets people", "Call say_hello with a name.").with_tool(SayHelloTool.spec());
        let vault = Skill::new("vault", "Secret store", "Restricted")
            .with_tool(ToolSpec::new("open_vault", "", ToolParameter::empty_object()))
            .with_visibility(Visibility::Restricted);
        Arc::new(SkillCatalog::new(vec![EchoTool.spec()], vec![hello, vault]).unwrap())
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();
        registry.register(SayHelloTool).unwrap();
        registry
    }

    fn agent_with(responses: Vec<MockResponse>, max_iterations: usize) -> (Agent, Arc<MockProvider>) {
        let provider = Arc::new(MockProvider::new(responses));
        let config = AgentConfig { require_executors: false, max_iterations, ..AgentConfig::default() };
        let agent =
            Agent::new(provider.clone(), catalog(), registry(), Arc::new(SessionStore::default()), config).unwrap();
        (agent, provider)
    }

    fn agent(responses: Vec<MockResponse>) -> (Agent, Arc<MockProvider>) {
        agent_with(responses, AgentConfig::default().max_iterations)
    }

    fn text(content: &str) -> MockResponse {
        MockResponse::Text { content: content.to_string() }
    }

    fn call(name: &str, args: serde_json::Value) -> MockResponse {
        MockResponse::ToolCall { name: name.to_string(), args }
    }

    #[tokio::test]
    async fn test_missing_executor_refuses_startup() {
        let provider = Arc::new(MockProvider::new(vec![]));
        let result =
            Agent::new(provider, catalog(), registry(), Arc::new(SessionStore::default()), AgentConfig::default());

        let Err(err) = result else {
            panic!("expected startup failure");
        };
        assert!(err.is_startup_fatal());
        assert!(err.to_string().contains("open_vault"));
    }

    #[tokio::test]
    async fn test_plain_reply() {
        let (agent, provider) = agent(vec![text("Hi there")]);
        let id = SessionId::parse("s1").unwrap();
        agent.sessions().open(id.clone()).await.unwrap();

        let outcome = agent.run_turn(&id, "hello").await.unwrap();
        assert_eq!(outcome.reply, "Hi there");
        assert_eq!(outcome.stop, StopReason::Completed);
        assert_eq!(outcome.iterations, 1);

        let requests = provider.requests();
        assert_eq!(requests[0].tool_names(), vec!["echo", "skill_hello_world"]);
        assert!(requests[0].messages[0].content.contains("skill_hello_world"));
        assert!(!requests[0].messages[0].content.contains("vault"));
    }

    #[tokio::test]
    async fn test_activation_then_tool_use() {
        let (agent, provider) = agent(vec![
            call("skill_hello_world", json!({})),
            call("say_hello", json!({"name": "Ada"})),
            text("Done"),
        ]);
        let id = SessionId::parse("s1").unwrap();
        agent.sessions().open(id.clone()).await.unwrap();

        let outcome = agent.run_turn(&id, "greet Ada").await.unwrap();
        assert_eq!(outcome.activated, vec!["hello_world"]);
        assert_eq!(outcome.active, vec!["hello_world"]);
        assert_eq!(outcome.iterations, 3);

        let requests = provider.requests();
        assert_eq!(requests[1].tool_names(), vec!["echo", "say_hello"]);

        let history = &requests[2].messages;
        let outputs: Vec<&str> = history.iter().filter(|m| m.tool_call_id.is_some()).map(|m| m.content.as_str()).collect();
        assert_eq!(outputs, vec!["Call say_hello with a name.", "Hello, Ada!"]);
    }

    #[tokio::test]
    async fn test_tool_outside_surface_is_blocked() {
        let (agent, provider) = agent(vec![call("say_hello", json!({"name": "Ada"})), text("ok")]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let agent = agent.with_event_sender(tx);
        let id = SessionId::parse("s1").unwrap();
        agent.sessions().open(id.clone()).await.unwrap();

        agent.run_turn(&id, "greet").await.unwrap();

        let recorded = &provider.requests()[1].messages;
        let last = recorded.last().unwrap();
        assert!(last.content.starts_with("Error: Tool 'say_hello' is not available"));

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(events.contains(&AgentEvent::ToolBlocked { name: "say_hello".to_string() }));
        assert!(!events.iter().any(|e| matches!(e, AgentEvent::ToolResult { .. })));
    }

    #[tokio::test]
    async fn test_restricted_activation_rejected() {
        let (agent, _provider) = agent(vec![call("skill_vault", json!({})), text("cannot")]);
        let id = SessionId::parse("s1").unwrap();
        agent.sessions().open(id.clone()).await.unwrap();

        let outcome = agent.run_turn(&id, "open the vault").await.unwrap();
        assert!(outcome.activated.is_empty());
        assert!(outcome.active.is_empty());
        assert!(!agent.surface(&id).await.unwrap().contains("skill_vault"));
    }

    #[tokio::test]
    async fn test_granted_session_can_activate_restricted() {
        let (agent, _provider) = agent(vec![call("skill_vault", json!({})), text("opened")]);
        let id = SessionId::parse("s1").unwrap();
        agent.sessions().open_with(id.clone(), PermissionContext::granting(["vault"])).await.unwrap();

        let outcome = agent.run_turn(&id, "open the vault").await.unwrap();
        assert_eq!(outcome.active, vec!["vault"]);
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let responses = (0..3).map(|_| call("echo", json!({"message": "again"}))).collect();
        let (agent, _provider) = agent_with(responses, 2);
        let id = SessionId::parse("s1").unwrap();
        agent.sessions().open(id.clone()).await.unwrap();

        let outcome = agent.run_turn(&id, "loop").await.unwrap();
        assert_eq!(outcome.stop, StopReason::IterationLimit);
        assert_eq!(outcome.iterations, 2);
    }

    #[tokio::test]
    async fn test_provider_error_aborts_turn() {
        let (agent, _provider) = agent(vec![MockResponse::Error { message: "boom".to_string() }]);
        let id = SessionId::parse("s1").unwrap();
        agent.sessions().open(id.clone()).await.unwrap();

        let err = agent.run_turn(&id, "hi").await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[tokio::test]
    async fn test_activate_outside_turn() {
        let (agent, provider) = agent(vec![text("ready")]);
        let id = SessionId::parse("s1").unwrap();
        agent.sessions().open(id.clone()).await.unwrap();

        assert!(matches!(agent.activate(&id, "hello_world").await.unwrap(), Interception::Activated(_)));
        assert!(matches!(agent.activate(&id, "vault").await.unwrap(), Interception::Rejected(_)));

        agent.run_turn(&id, "hi").await.unwrap();
        let request = &provider.requests()[0];
        assert_eq!(request.tool_names(), vec!["echo", "say_hello"]);

        let roles: Vec<Role> = request.messages.iter().map(|m| m.role.clone()).collect();
        assert_eq!(roles, vec![Role::System, Role::Assistant, Role::Tool, Role::User]);
        assert_eq!(request.messages[1].tool_calls.as_ref().unwrap()[0].name(), "skill_hello_world");
        assert_eq!(request.messages[2].content, "Call say_hello with a name.");
    }

    #[tokio::test]
    async fn test_rejected_activation_leaves_history_empty() {
        let (agent, _provider) = agent(vec![]);
        let id = SessionId::parse("s1").unwrap();
        agent.sessions().open(id.clone()).await.unwrap();

        agent.activate(&id, "vault").await.unwrap();
        let handle = agent.sessions().require(&id).await.unwrap();
        assert!(handle.lock().await.history().is_empty());
    }

    #[tokio::test]
    async fn test_deactivate_retires_tools() {
        let (agent, provider) = agent(vec![text("bye")]);
        let id = SessionId::parse("s1").unwrap();
        agent.sessions().open(id.clone()).await.unwrap();

        agent.activate(&id, "hello_world").await.unwrap();
        assert!(agent.deactivate(&id, "hello_world").await.unwrap());
        assert!(!agent.deactivate(&id, "hello_world").await.unwrap());
        assert!(!agent.surface(&id).await.unwrap().contains("say_hello"));

        agent.run_turn(&id, "hi").await.unwrap();
        assert_eq!(provider.requests()[0].tool_names(), vec!["echo", "skill_hello_world"]);
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let (agent, _provider) = agent(vec![]);
        let id = SessionId::parse("missing").unwrap();
        assert!(agent.run_turn(&id, "hi").await.is_err());
    }
}
