//! Turn driver (C10, §4.1): composes the router, the four C2-C5 workers,
//! the synthesizer, and the projector into one turn.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use banking_correction::CorrectionWorker;
use banking_hooks::HookRegistry;
use banking_llm::Provider;
use banking_nlu::{EntityExtractionWorker, ExtractionOutcome};
use banking_present::format_stage;
use banking_projector::Projection;
use banking_protocol::hook::{Hook, HookAction, HookContext, HookPoint};
use banking_protocol::id::SessionId;
use banking_router::ProductDescriptor;
use banking_scenario_engine::ScenarioEngineReply;
use banking_types::{
    ConversationState, FieldSpec, PlanItem, ProductType, Scenario, Stage, TurnState,
    MAX_ROUTER_CALLS,
};
use banking_worker::{WorkerDyn, WorkerRegistry};
use serde_json::json;

use crate::product::ProductBinding;

const DEFAULT_DIRECT_RESPONSE: &str = "네, 알겠습니다.";
const DEFAULT_END_MESSAGE: &str = "상담을 종료합니다. 이용해주셔서 감사합니다.";
const WEB_SEARCH_UNAVAILABLE: &str = "죄송합니다, 지금은 외부 정보 검색 기능을 지원하지 않습니다.";
const HALT_APOLOGY: &str = "요청 처리를 중단했습니다. 잠시 후 다시 시도해 주세요.";
const PRODUCT_NOT_READY: &str = "죄송합니다. 해당 상품 상담은 현재 준비 중입니다.";

fn direct_tools() -> &'static [&'static str] {
    &["answer_directly_chit_chat", "select_product_type", "clarify_product_type", "unclear_input"]
}

/// What one turn produces (§6 `POST /turn`), minus the transport-layer
/// session identifier.
pub struct TurnOutcome {
    /// The single assistant reply for this turn.
    pub reply: String,
    /// The conversation state to persist as this session's new state.
    pub state: ConversationState,
    /// The UI delta (§6 `slot_filling_update`), `None` when no product
    /// has been selected yet (nothing to project).
    pub projection: Option<Projection>,
}

/// Composes C1(loaded)-C9 into one turn, generic over the LLM provider
/// every sub-worker and the router/synthesizer call through.
pub struct TurnDriver<P: Provider + Clone + Send + Sync + 'static> {
    provider: P,
    products: Vec<ProductDescriptor>,
    bindings: HashMap<ProductType, ProductBinding>,
    registry: WorkerRegistry,
    hooks: HookRegistry,
}

impl<P: Provider + Clone + Send + Sync + 'static> TurnDriver<P> {
    /// Start a driver with no products registered yet — add them with
    /// [`TurnDriver::register_product`].
    pub fn new(provider: P, products: Vec<ProductDescriptor>) -> Self {
        let mut registry = WorkerRegistry::new();
        registry.register(Arc::new(EntityExtractionWorker::new(provider.clone())));
        registry.register(Arc::new(CorrectionWorker::new(provider.clone())));
        Self {
            provider,
            products,
            bindings: HashMap::new(),
            registry,
            hooks: HookRegistry::new(),
        }
    }

    /// Bind one product's scenario and QA worker. The scenario-engine
    /// worker is built here, around a clone of the driver's provider.
    pub fn register_product(&mut self, scenario: Arc<Scenario>, qa_agent: Arc<dyn WorkerDyn>, manual: impl Into<String>) {
        let product_type = scenario.product_id;
        let scenario_engine: Arc<dyn WorkerDyn> = Arc::new(banking_scenario_engine::ScenarioEngineWorker::new(
            self.provider.clone(),
            scenario.clone(),
        ));
        self.bindings.insert(product_type, ProductBinding::new(scenario, scenario_engine, qa_agent, manual));
    }

    /// Register a hook to the turn pipeline, in call order.
    pub fn add_hook(&mut self, hook: Arc<dyn Hook>) {
        self.hooks.add(hook);
    }

    fn current_stage<'a>(&'a self, state: &ConversationState) -> Option<(&'a Scenario, &'a Stage)> {
        let product = state.current_product_type?;
        let binding = self.bindings.get(&product)?;
        let stage_id = state
            .current_scenario_stage_id
            .as_deref()
            .unwrap_or(&binding.scenario.initial_stage_id);
        let stage = binding.scenario.stage(stage_id)?;
        Some((binding.scenario.as_ref(), stage))
    }

    fn format_current_stage(&self, state: &ConversationState) -> Option<String> {
        let (scenario, stage) = self.current_stage(state)?;
        Some(format_stage(stage, scenario, state).text)
    }

    fn hook_ctx(&self, point: HookPoint, session_id: &SessionId, state: &ConversationState, turn: &TurnState) -> HookContext {
        let mut ctx = HookContext::new(point, session_id.as_str().to_string());
        ctx.stage_id = state.current_scenario_stage_id.clone();
        ctx.router_call_count = turn.router_call_count;
        ctx
    }

    /// Run one turn to completion (§4.1). Never returns an error — every
    /// sub-failure is recovered locally and recorded on `turn.error_message`
    /// per §7's policy.
    pub async fn run_turn(&self, session_id: &SessionId, mut state: ConversationState, user_input: &str) -> TurnOutcome {
        let mut turn = TurnState::new(user_input);
        state.push_user_message(user_input);
        let mut stage_message: Option<String> = None;

        let pre_route = self.hook_ctx(HookPoint::PreRoute, session_id, &state, &turn);
        if let HookAction::Halt { reason } = self.hooks.dispatch(&pre_route).await {
            tracing::warn!(reason = %reason, "pre-route hook halted the turn");
            return self.finish(session_id, state, turn, stage_message).await;
        }

        // §4.1 step 2, resolved against the original implementation's
        // guard (`scenario_ready_for_continuation AND current_product_type`)
        // rather than the distilled spec's literal "product type is
        // unset" — see DESIGN.md.
        if state.current_product_type.is_some() && state.scenario_ready_for_continuation {
            turn.action_plan_struct = vec![PlanItem::bare("invoke_scenario_agent")];
            state.scenario_ready_for_continuation = false;
        } else {
            let stage = self.current_stage(&state).map(|(_, stage)| stage);
            let manual = state
                .current_product_type
                .and_then(|p| self.bindings.get(&p))
                .map(|b| b.manual.as_str())
                .unwrap_or("");
            turn.action_plan_struct = banking_router::route(&self.provider, user_input, &state, stage, &self.products, manual).await;
        }

        let post_route = self.hook_ctx(HookPoint::PostRoute, session_id, &state, &turn);
        if let HookAction::Halt { reason } = self.hooks.dispatch(&post_route).await {
            tracing::warn!(reason = %reason, "post-route hook halted the turn");
            return self.finish(session_id, state, turn, stage_message).await;
        }

        let mut queue: VecDeque<PlanItem> = turn.action_plan_struct.drain(..).collect();

        while let Some(item) = queue.pop_front() {
            if turn.router_call_count >= MAX_ROUTER_CALLS {
                turn.error_message = Some("router_call_count exceeded MAX_ROUTER_CALLS".to_string());
                break;
            }
            turn.router_call_count += 1;
            turn.action_plan.push(item.tool.clone());

            let mut pre_worker = self.hook_ctx(HookPoint::PreWorker, session_id, &state, &turn);
            pre_worker.worker_name = Some(item.tool.clone());
            if let HookAction::Halt { reason } = self.hooks.dispatch(&pre_worker).await {
                tracing::warn!(reason = %reason, tool = %item.tool, "pre-worker hook halted the turn");
                break;
            }

            self.dispatch(&item, &mut state, &mut turn, &mut queue, &mut stage_message).await;

            let mut post_worker = self.hook_ctx(HookPoint::PostWorker, session_id, &state, &turn);
            post_worker.worker_name = Some(item.tool.clone());
            if let HookAction::Halt { reason } = self.hooks.dispatch(&post_worker).await {
                tracing::warn!(reason = %reason, tool = %item.tool, "post-worker hook halted the turn");
                break;
            }

            if turn.is_final_turn_response {
                break;
            }
        }

        self.finish(session_id, state, turn, stage_message).await
    }

    async fn dispatch(
        &self,
        item: &PlanItem,
        state: &mut ConversationState,
        turn: &mut TurnState,
        queue: &mut VecDeque<PlanItem>,
        stage_message: &mut Option<String>,
    ) {
        match item.tool.as_str() {
            "set_product_type" => self.handle_set_product_type(item, state, turn),
            "invoke_scenario_agent" => self.handle_scenario_agent(state, turn, stage_message).await,
            "invoke_qa_agent" => self.handle_qa_agent(item, state, turn).await,
            "personal_info_correction" => self.handle_correction(item, state, turn, queue).await,
            "end_conversation" => self.handle_end_conversation(state, turn),
            "invoke_web_search" => turn.router_direct_response = Some(WEB_SEARCH_UNAVAILABLE.to_string()),
            tool if direct_tools().contains(&tool) => {
                let text = item
                    .tool_input
                    .get("direct_response")
                    .and_then(|v| v.as_str())
                    .unwrap_or(DEFAULT_DIRECT_RESPONSE);
                turn.router_direct_response = Some(text.to_string());
            }
            other => {
                tracing::warn!(tool = %other, "action plan named an unrecognized tool");
                turn.router_direct_response = Some(DEFAULT_DIRECT_RESPONSE.to_string());
            }
        }
    }

    fn handle_set_product_type(&self, item: &PlanItem, state: &mut ConversationState, turn: &mut TurnState) {
        let Some(product_str) = item.tool_input.get("product_type").and_then(|v| v.as_str()) else {
            turn.error_message = Some("set_product_type missing product_type".to_string());
            return;
        };
        let Some(product_type) = self.products.iter().map(|p| p.product_type).find(|p| p.as_str() == product_str) else {
            turn.error_message = Some(format!("unknown product_type {product_str:?}"));
            return;
        };
        let Some(binding) = self.bindings.get(&product_type) else {
            turn.router_direct_response = Some(PRODUCT_NOT_READY.to_string());
            return;
        };
        state.current_product_type = Some(product_type);
        state.current_scenario_stage_id = Some(binding.scenario.initial_stage_id.clone());
    }

    async fn handle_scenario_agent(&self, state: &mut ConversationState, turn: &mut TurnState, stage_message: &mut Option<String>) {
        let Some(product_type) = state.current_product_type else {
            turn.router_direct_response = Some(DEFAULT_DIRECT_RESPONSE.to_string());
            return;
        };
        let Some(binding) = self.bindings.get(&product_type) else {
            turn.router_direct_response = Some(PRODUCT_NOT_READY.to_string());
            return;
        };

        let unfilled: Vec<FieldSpec> = binding
            .scenario
            .required_info_fields
            .iter()
            .filter(|f| !state.collected_info.contains_key(&f.key))
            .cloned()
            .collect();

        let extractor = self.registry.get("entity_extraction").expect("entity_extraction is always registered");
        match extractor.call(state, json!({ "fields": unfilled })).await {
            Ok(output) => {
                if let Ok(outcome) = serde_json::from_value::<ExtractionOutcome>(output.payload) {
                    turn.extracted_entities = outcome.extracted;
                }
                output.patch.apply_to(state);
            }
            Err(err) => {
                tracing::warn!(error = %err, "entity extraction failed; scenario engine runs without this turn's entities");
                turn.error_message = Some(err.to_string());
            }
        }

        match binding.scenario_engine.call(state, json!({ "intent": turn.scenario_nlu.intent })).await {
            Ok(output) => {
                let message = serde_json::from_value::<ScenarioEngineReply>(output.payload).ok().and_then(|r| r.message);
                output.patch.apply_to(state);
                if message.is_some() {
                    *stage_message = message;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "scenario engine failed");
                turn.error_message = Some(err.to_string());
            }
        }
    }

    async fn handle_qa_agent(&self, item: &PlanItem, state: &mut ConversationState, turn: &mut TurnState) {
        let question = item
            .tool_input
            .get("question")
            .and_then(|v| v.as_str())
            .unwrap_or(&turn.user_input)
            .to_string();

        let Some(product_type) = state.current_product_type else {
            turn.factual_response = Some(PRODUCT_NOT_READY.to_string());
            return;
        };
        let Some(binding) = self.bindings.get(&product_type) else {
            turn.factual_response = Some(PRODUCT_NOT_READY.to_string());
            return;
        };

        match binding.qa_agent.call(state, json!({ "question": question })).await {
            Ok(output) => {
                if let Some(text) = output.payload.get("factual_response").and_then(|v| v.as_str()) {
                    turn.factual_response = Some(text.to_string());
                }
                output.patch.apply_to(state);
            }
            Err(err) => {
                tracing::warn!(error = %err, "qa_agent worker failed");
                turn.error_message = Some(err.to_string());
                turn.factual_response = Some(PRODUCT_NOT_READY.to_string());
            }
        }
    }

    async fn handle_correction(&self, _item: &PlanItem, state: &mut ConversationState, turn: &mut TurnState, queue: &mut VecDeque<PlanItem>) {
        let fields: Vec<FieldSpec> = state
            .current_product_type
            .and_then(|p| self.bindings.get(&p))
            .map(|b| b.scenario.required_info_fields.clone())
            .unwrap_or_default();
        let is_confirmation_stage = state.current_scenario_stage_id.as_deref() == Some("customer_info_check");

        let worker = self.registry.get("personal_info_correction").expect("personal_info_correction is always registered");
        let input = json!({ "fields": fields, "is_confirmation_stage": is_confirmation_stage });

        match worker.call(state, input).await {
            Ok(output) => {
                let reply = serde_json::from_value::<banking_correction::CorrectionReply>(output.payload).ok();
                output.patch.apply_to(state);
                if let Some(reply) = reply {
                    if reply.is_final {
                        turn.final_response_text = Some(reply.reply);
                        turn.is_final_turn_response = true;
                    }
                    if reply.advance_scenario {
                        queue.push_front(PlanItem::bare("invoke_scenario_agent"));
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "personal_info_correction worker failed");
                turn.error_message = Some(err.to_string());
            }
        }
    }

    fn handle_end_conversation(&self, state: &ConversationState, turn: &mut TurnState) {
        let message = state
            .current_product_type
            .and_then(|p| self.bindings.get(&p))
            .map(|b| b.scenario.end_message.clone())
            .unwrap_or_else(|| DEFAULT_END_MESSAGE.to_string());
        turn.final_response_text = Some(message);
        turn.is_final_turn_response = true;
    }

    async fn finish(&self, session_id: &SessionId, mut state: ConversationState, mut turn: TurnState, stage_message: Option<String>) -> TurnOutcome {
        let stage_prompt = stage_message.or_else(|| self.format_current_stage(&state));

        let pre_synthesis = self.hook_ctx(HookPoint::PreSynthesis, session_id, &state, &turn);
        if let HookAction::Halt { reason } = self.hooks.dispatch(&pre_synthesis).await {
            tracing::warn!(reason = %reason, "pre-synthesis hook halted the turn");
            turn.router_direct_response = turn.router_direct_response.or_else(|| Some(HALT_APOLOGY.to_string()));
        }

        let reply = banking_present::synth::synthesize(&self.provider, &turn, stage_prompt.as_deref()).await;
        banking_present::synth::finalize(&mut state, &mut turn, reply.clone());

        let projection = self.current_stage(&state).map(|(scenario, stage)| banking_projector::project(scenario, stage, &state));

        let turn_end = self.hook_ctx(HookPoint::TurnEnd, session_id, &state, &turn);
        let _ = self.hooks.dispatch(&turn_end).await;

        TurnOutcome { reply, state, projection }
    }
}
