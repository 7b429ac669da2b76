use std::sync::Arc;

use serde_json::json;
use skillgate_middleware::{ActivationInterceptor, Interception, RejectionReason, ToolSurface, ToolSurfaceResolver};
use skillgate_providers::{ToolCall, ToolParameter, ToolSpec};
use skillgate_skills::{PermissionContext, SessionSkillState, Skill, SkillCatalog, TransitionMode, Visibility};

fn tool(name: &str) -> ToolSpec {
    ToolSpec::new(name, format!("{name} tool"), ToolParameter::empty_object())
}

fn catalog() -> Arc<SkillCatalog> {
    let skills = vec![
        Skill::new("a", "Skill A", "Instructions for A").with_tool(tool("t1")),
        Skill::new("b", "Skill B", "Instructions for B").with_tool(tool("t2")),
        Skill::new("c", "Skill C", "Instructions for C").with_tool(tool("t3")),
        Skill::new("d", "Skill D", "Instructions for D").with_tool(tool("t4")).with_visibility(Visibility::Restricted),
    ];
    Arc::new(SkillCatalog::new(Vec::new(), skills).unwrap())
}

struct Session {
    interceptor: ActivationInterceptor,
    state: SessionSkillState,
    permissions: PermissionContext,
    calls: usize,
}

impl Session {
    fn new(state: SessionSkillState, permissions: PermissionContext) -> Self {
        let interceptor = ActivationInterceptor::new(ToolSurfaceResolver::new(catalog()));
        Self { interceptor, state, permissions, calls: 0 }
    }

    fn activate(&mut self, skill_id: &str) -> Interception {
        self.calls += 1;
        let call = ToolCall::new(format!("call_{}", self.calls), format!("skill_{skill_id}"), json!({}));
        self.interceptor.handle(&mut self.state, &self.permissions, &call)
    }

    fn surface(&self) -> ToolSurface {
        self.interceptor.resolver().resolve(&self.state, &self.permissions)
    }

    fn visible_tools(&self) -> Vec<String> {
        self.surface().tool_names().into_iter().map(String::from).collect()
    }

    fn active(&self) -> Vec<&str> {
        self.state.active().iter().map(String::as_str).collect()
    }
}

#[test]
fn test_replace_scenario() {
    let mut session = Session::new(SessionSkillState::new(TransitionMode::Replace), PermissionContext::none());

    assert!(matches!(session.activate("a"), Interception::Activated(_)));
    assert_eq!(session.visible_tools(), vec!["t1"]);

    assert!(matches!(session.activate("b"), Interception::Activated(_)));
    assert_eq!(session.visible_tools(), vec!["t2"]);
    assert_eq!(session.active(), vec!["b"]);
}

#[test]
fn test_accumulate_scenario() {
    let mut session = Session::new(SessionSkillState::new(TransitionMode::Accumulate), PermissionContext::none());

    session.activate("a");
    session.activate("b");
    assert_eq!(session.visible_tools(), vec!["t1", "t2"]);
    assert_eq!(session.active(), vec!["a", "b"]);
}

#[test]
fn test_fifo_scenario() {
    let state = SessionSkillState::with_capacity(TransitionMode::Fifo, 2).unwrap();
    let mut session = Session::new(state, PermissionContext::none());

    session.activate("a");
    session.activate("b");
    session.activate("c");
    assert_eq!(session.active(), vec!["b", "c"]);
    assert_eq!(session.visible_tools(), vec!["t2", "t3"]);
    assert!(session.surface().activatable().contains(&"a"));
}

#[test]
fn test_restricted_scenario() {
    let mut session = Session::new(SessionSkillState::new(TransitionMode::Accumulate), PermissionContext::none());
    session.activate("a");
    let before = session.state.clone();

    assert!(!session.surface().activatable().contains(&"d"));

    let Interception::Rejected(rejection) = session.activate("d") else {
        panic!("restricted skill must be rejected");
    };
    assert_eq!(rejection.reason, RejectionReason::PermissionDenied);
    assert_eq!(session.state, before);
    assert!(!session.surface().activatable().contains(&"d"));
    assert!(!session.surface().contains("t4"));
}

#[test]
fn test_activation_result_carries_updated_surface() {
    let mut session = Session::new(SessionSkillState::new(TransitionMode::Accumulate), PermissionContext::none());

    let Interception::Activated(result) = session.activate("b") else {
        panic!("expected activation");
    };
    assert_eq!(result.instructions, "Instructions for B");
    assert_eq!(result.surface, session.surface());
}

#[test]
fn test_invariants_across_modes() {
    let sequence = ["a", "d", "b", "a", "zzz", "c", "b", "a", "c", "d"];

    for mode in TransitionMode::VALUES {
        let state = SessionSkillState::with_capacity(*mode, 2).unwrap();
        let mut session = Session::new(state, PermissionContext::none());
        let mut last_granted = None;

        for id in sequence {
            let before = session.state.clone();

            match session.activate(id) {
                Interception::Activated(_) => last_granted = Some(id),
                Interception::Rejected(_) => assert_eq!(session.state, before, "rejection mutated state"),
                Interception::PassThrough => panic!("activation call passed through"),
            }

            let replay = Session::new(session.state.clone(), PermissionContext::none());
            assert_eq!(session.surface(), replay.surface());

            let active = session.active();
            let mut unique = active.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), active.len(), "duplicate active skill under {mode}");
            assert!(!session.surface().activatable().contains(&"d"));

            match mode {
                TransitionMode::Replace => assert_eq!(active, last_granted.into_iter().collect::<Vec<_>>()),
                TransitionMode::Fifo => assert!(active.len() <= 2),
                TransitionMode::Accumulate => {}
            }
        }
    }
}

#[test]
fn test_unknown_skill_rejected_like_denied() {
    let mut session = Session::new(SessionSkillState::new(TransitionMode::Replace), PermissionContext::none());

    let (Interception::Rejected(missing), Interception::Rejected(denied)) = (session.activate("zzz"), session.activate("d"))
    else {
        panic!("expected two rejections");
    };
    assert_eq!(missing.reason, RejectionReason::SkillNotFound);
    let strip = |r: &skillgate_middleware::ActivationRejection| r.message().replace(&r.skill_id, "<id>");
    assert_eq!(strip(&missing), strip(&denied));
}

#[test]
fn test_wildcard_grants_restricted() {
    let mut session = Session::new(SessionSkillState::new(TransitionMode::Replace), PermissionContext::all());
    assert!(session.surface().activatable().contains(&"d"));
    assert!(matches!(session.activate("d"), Interception::Activated(_)));
    assert_eq!(session.visible_tools(), vec!["t4"]);
}
