//! Integration tests for the turn driver (C10): the router, the C2-C5
//! workers, the hook pipeline, and the synthesizer wired together end
//! to end, against a small fixture scenario.

use std::collections::HashMap as Map;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use banking_correction::CorrectionWorker;
use banking_driver::TurnDriver;
use banking_llm::MockProvider;
use banking_protocol::hook::{Hook, HookAction, HookContext, HookPoint};
use banking_protocol::id::SessionId;
use banking_router::ProductDescriptor;
use banking_types::{
    CollectedValue, ConversationState, FieldGroup, FieldSpec, FieldType, Message, ProductType,
    ResponseType, Scenario, Stage, StageKind, Transition,
};
use banking_worker::{WorkerDyn, WorkerError, WorkerOutput};
use serde_json::json;

fn name_field() -> FieldSpec {
    FieldSpec {
        key: "name".into(),
        display_name: "성명".into(),
        field_type: FieldType::Text,
        required: true,
        choices: Vec::new(),
        unit: None,
        description: None,
        show_when: None,
        parent_field: None,
        default: None,
        group: "basic_info".into(),
    }
}

/// A two-stage scenario: `ask_name` collects `name`, then advances
/// unconditionally to the terminal `done` stage.
fn fixture_scenario() -> Arc<Scenario> {
    let mut stages = Map::new();
    stages.insert(
        "ask_name".to_string(),
        Stage {
            id: "ask_name".into(),
            kind: StageKind::SlotFilling {
                expected_info_key: "name".into(),
            },
            prompt: Some("성함을 알려주세요.".into()),
            response_type: ResponseType::Narrative,
            choices: Vec::new(),
            visible_groups: vec!["basic_info".into()],
            transitions: vec![Transition {
                condition_description: "항상".into(),
                next_stage_id: "done".into(),
                example_phrases: Vec::new(),
            }],
            default_next_stage_id: None,
            modifiable_fields: vec!["name".into()],
            completion_message: Some("감사합니다. 확인되었습니다.".into()),
        },
    );
    stages.insert(
        "done".to_string(),
        Stage {
            id: "done".into(),
            kind: StageKind::Terminal,
            prompt: Some("상담이 완료되었습니다.".into()),
            response_type: ResponseType::Narrative,
            choices: Vec::new(),
            visible_groups: Vec::new(),
            transitions: Vec::new(),
            default_next_stage_id: None,
            modifiable_fields: Vec::new(),
            completion_message: None,
        },
    );
    Arc::new(Scenario {
        product_id: ProductType::Didimdol,
        initial_stage_id: "ask_name".into(),
        stages,
        required_info_fields: vec![name_field()],
        field_groups: vec![FieldGroup {
            id: "basic_info".into(),
            name: "기본 정보".into(),
            field_keys: vec!["name".into()],
        }],
        end_message: "상담을 종료합니다. 이용해주셔서 감사합니다.".into(),
        display_labels: Map::new(),
    })
}

fn products() -> Vec<ProductDescriptor> {
    vec![ProductDescriptor {
        product_type: ProductType::Didimdol,
        description: "주택 구입 자금 대출".into(),
    }]
}

struct StubQaWorker {
    answer: String,
}

#[async_trait]
impl WorkerDyn for StubQaWorker {
    fn name(&self) -> &str {
        "qa_agent"
    }

    fn description(&self) -> &str {
        "Fixed-answer stand-in for the retrieval worker"
    }

    async fn call(&self, _state: &ConversationState, _input: serde_json::Value) -> Result<WorkerOutput, WorkerError> {
        Ok(WorkerOutput {
            patch: Default::default(),
            payload: json!({ "factual_response": self.answer }),
        })
    }
}

fn build_driver(canned_response: &str) -> TurnDriver<Arc<MockProvider>> {
    let provider = Arc::new(MockProvider::with_text(canned_response));
    let mut driver = TurnDriver::new(provider, products());
    driver.register_product(
        fixture_scenario(),
        Arc::new(StubQaWorker {
            answer: "디딤돌 대출 금리는 연 2.5%입니다.".into(),
        }),
        "디딤돌 대출 상품 매뉴얼 발췌...",
    );
    driver
}

fn state_with_product_selected() -> ConversationState {
    let mut state = ConversationState::new();
    state.current_product_type = Some(ProductType::Didimdol);
    state.current_scenario_stage_id = Some("ask_name".to_string());
    state.collected_info.insert("name".to_string(), CollectedValue::Text("김민준".into()));
    state
}

#[tokio::test]
async fn product_selection_sets_current_product_and_emits_initial_prompt() {
    let driver = build_driver(r#"{"action": "proceed_with_product_type_didimdol"}"#);
    let session = SessionId::new("s1");

    let outcome = driver.run_turn(&session, ConversationState::new(), "디딤돌 대출 알아보고 싶어요").await;

    assert_eq!(outcome.state.current_product_type, Some(ProductType::Didimdol));
    assert_eq!(outcome.state.current_scenario_stage_id, Some("ask_name".to_string()));
    assert_eq!(outcome.reply, "성함을 알려주세요.");
    assert!(outcome.projection.is_some());
}

#[tokio::test]
async fn slot_fill_advances_stage_and_surfaces_completion_message() {
    let driver = build_driver(r#"{"action_plan": [{"tool": "invoke_scenario_agent"}]}"#);
    let session = SessionId::new("s2");

    let outcome = driver.run_turn(&session, state_with_product_selected(), "김민준입니다").await;

    assert_eq!(outcome.state.current_scenario_stage_id, Some("done".to_string()));
    assert_eq!(outcome.reply, "감사합니다. 확인되었습니다.");
}

#[tokio::test]
async fn qa_and_scenario_interleave_merges_factual_and_stage_reply() {
    let canned = r#"{"action_plan": [{"tool": "invoke_qa_agent"}, {"tool": "invoke_scenario_agent"}]}"#;
    let driver = build_driver(canned);
    let session = SessionId::new("s3");

    let outcome = driver
        .run_turn(&session, state_with_product_selected(), "금리가 어떻게 되나요? 저는 김민준입니다")
        .await;

    // Both a factual answer and a real stage completion message existed
    // this turn, so synthesis merges them through the LLM rung of the
    // priority chain rather than picking one verbatim — the mock
    // provider's one canned response stands in for the merged text.
    assert_eq!(outcome.reply, canned);
    assert_eq!(outcome.state.current_scenario_stage_id, Some("done".to_string()));
}

#[tokio::test]
async fn correction_advance_scenario_requeues_scenario_engine_same_turn() {
    let canned = r#"{"action_plan": [{"tool": "personal_info_correction"}]}"#;
    let provider = Arc::new(MockProvider::with_text(canned));
    let mut driver = TurnDriver::new(provider, products());
    driver.register_product(
        fixture_scenario(),
        Arc::new(StubQaWorker { answer: String::new() }),
        "",
    );

    let mut state = state_with_product_selected();
    state.waiting_for_additional_modifications = true;
    state.push_assistant_message("다른 수정사항 있으실까요?");

    let session = SessionId::new("s4");
    let outcome = driver.run_turn(&session, state, "없어요 더 없어요").await;

    // The correction worker signalled `advance_scenario`, so the driver
    // re-queued `invoke_scenario_agent` within the same turn, which
    // completed `ask_name` (already filled) and produced its message.
    assert_eq!(outcome.state.current_scenario_stage_id, Some("done".to_string()));
    assert_eq!(outcome.reply, "감사합니다. 확인되었습니다.");
    assert_eq!(outcome.state.waiting_for_additional_modifications, false);
}

struct HaltOnFirstWorker;

#[async_trait]
impl Hook for HaltOnFirstWorker {
    fn points(&self) -> &[HookPoint] {
        &[HookPoint::PreWorker]
    }

    async fn on_event(&self, _ctx: &HookContext) -> Result<HookAction, banking_protocol::error::HookError> {
        Ok(HookAction::Halt {
            reason: "guardrail tripped".to_string(),
        })
    }
}

#[tokio::test]
async fn hook_halt_before_a_worker_still_produces_a_reply() {
    let canned = r#"{"action_plan": [{"tool": "invoke_scenario_agent"}, {"tool": "invoke_qa_agent"}]}"#;
    let provider = Arc::new(MockProvider::with_text(canned));
    let mut driver = TurnDriver::new(provider, products());
    driver.register_product(
        fixture_scenario(),
        Arc::new(StubQaWorker {
            answer: "금리는 2.5%입니다.".into(),
        }),
        "",
    );
    driver.add_hook(Arc::new(HaltOnFirstWorker));

    let session = SessionId::new("s5");
    let outcome = driver.run_turn(&session, state_with_product_selected(), "김민준입니다").await;

    // No worker ever ran (the halt fires at PreWorker, before dispatch),
    // so the stage never advanced and synthesis fell through to the
    // current stage's own prompt.
    assert_eq!(outcome.state.current_scenario_stage_id, Some("ask_name".to_string()));
    assert_eq!(outcome.reply, "성함을 알려주세요.");
}

struct CountingHook {
    count: Arc<AtomicUsize>,
}

#[async_trait]
impl Hook for CountingHook {
    fn points(&self) -> &[HookPoint] {
        &[HookPoint::PreWorker]
    }

    async fn on_event(&self, _ctx: &HookContext) -> Result<HookAction, banking_protocol::error::HookError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(HookAction::Continue)
    }
}

#[tokio::test]
async fn loop_budget_caps_dispatch_at_max_router_calls() {
    let items: Vec<String> = (0..25).map(|_| r#"{"tool": "invoke_web_search"}"#.to_string()).collect();
    let canned = format!(r#"{{"action_plan": [{}]}}"#, items.join(", "));
    let provider = Arc::new(MockProvider::with_text(canned));
    let mut driver = TurnDriver::new(provider, products());
    driver.register_product(
        fixture_scenario(),
        Arc::new(StubQaWorker { answer: String::new() }),
        "",
    );

    let count = Arc::new(AtomicUsize::new(0));
    driver.add_hook(Arc::new(CountingHook { count: count.clone() }));

    let session = SessionId::new("s6");
    let _ = driver.run_turn(&session, state_with_product_selected(), "아무 말").await;

    assert_eq!(count.load(Ordering::SeqCst), banking_types::MAX_ROUTER_CALLS as usize);
}

#[tokio::test]
async fn end_conversation_uses_the_scenarios_own_end_message() {
    let canned = r#"{"action_plan": [{"tool": "end_conversation"}]}"#;
    let driver = build_driver(canned);
    let session = SessionId::new("s7");

    let outcome = driver.run_turn(&session, state_with_product_selected(), "그만할게요").await;

    assert_eq!(outcome.reply, "상담을 종료합니다. 이용해주셔서 감사합니다.");
}

#[allow(dead_code)]
fn _assert_correction_worker_registers_under_fixed_name() {
    fn is_send_sync<T: Send + Sync>() {}
    is_send_sync::<CorrectionWorker<Arc<MockProvider>>>();
}

#[allow(dead_code)]
fn _assert_messages_preserved() {
    let _ = Message::user("x");
}
