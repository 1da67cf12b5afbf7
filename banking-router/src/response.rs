//! Strict-JSON action-plan contract (§4.6): the raw shapes the router's
//! two prompt variants are expected to return, plus validation against
//! the fixed action vocabularies.

use banking_types::{PlanItem, ProductType};
use serde::Deserialize;
use serde_json::Value;

/// Apology used whenever the router's response can't be trusted: failed
/// to parse, failed schema validation, or named an unknown action (§7
/// `RoutingError`, "recovered locally").
pub const FALLBACK_APOLOGY: &str = "요청 처리 중 오류가 발생했습니다";

const TASK_ACTIONS: &[&str] = &[
    "select_product_type",
    "invoke_scenario_agent",
    "invoke_qa_agent",
    "invoke_web_search",
    "answer_directly_chit_chat",
    "personal_info_correction",
    "end_conversation",
    "unclear_input",
];

const GUIDANCE_ACTIONS: &[&str] = &["invoke_qa_agent_general", "answer_directly_chit_chat", "clarify_product_type"];

const SET_PRODUCT_PREFIX: &str = "set_product_type_";
const PROCEED_PREFIX: &str = "proceed_with_product_type_";

fn strip_product_suffix<'a>(action: &'a str, prefix: &str, products: &[ProductType]) -> Option<&'a str> {
    let suffix = action.strip_prefix(prefix)?;
    products.iter().any(|p| p.as_str() == suffix).then_some(suffix)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGuidanceResponse {
    pub action: String,
    #[serde(default)]
    pub direct_response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPlanItem {
    pub tool: String,
    #[serde(default)]
    pub tool_input: Value,
    #[serde(default)]
    pub direct_response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawActionPlan {
    pub action_plan: Vec<RawPlanItem>,
}

/// The single fallback plan emitted on any parse or validation failure.
pub fn fallback_plan() -> Vec<PlanItem> {
    vec![PlanItem {
        tool: "answer_directly_chit_chat".to_string(),
        tool_input: serde_json::json!({ "direct_response": FALLBACK_APOLOGY }),
    }]
}

/// Parse and validate a business-guidance response, mapping its single
/// classification onto the same `tool`/`tool_input` shape the driver
/// dispatches for task-management plans, so the dispatch loop has one
/// code path regardless of which prompt variant ran.
pub(crate) fn parse_guidance_response(raw: &str, products: &[ProductType]) -> Option<Vec<PlanItem>> {
    let parsed: RawGuidanceResponse = serde_json::from_str(raw).ok()?;

    if let Some(product) = strip_product_suffix(&parsed.action, PROCEED_PREFIX, products) {
        return Some(vec![PlanItem {
            tool: "set_product_type".to_string(),
            tool_input: serde_json::json!({ "product_type": product }),
        }]);
    }

    if !GUIDANCE_ACTIONS.contains(&parsed.action.as_str()) {
        return None;
    }

    let tool = match parsed.action.as_str() {
        "invoke_qa_agent_general" => "invoke_qa_agent",
        other => other,
    };
    let tool_input = match parsed.direct_response {
        Some(text) => serde_json::json!({ "direct_response": text }),
        None => Value::Null,
    };
    Some(vec![PlanItem {
        tool: tool.to_string(),
        tool_input,
    }])
}

/// Parse and validate a task-management action plan.
pub(crate) fn parse_task_plan(raw: &str, products: &[ProductType]) -> Option<Vec<PlanItem>> {
    let parsed: RawActionPlan = serde_json::from_str(raw).ok()?;
    if parsed.action_plan.is_empty() {
        return None;
    }

    let mut items = Vec::with_capacity(parsed.action_plan.len());
    for item in parsed.action_plan {
        if let Some(product) = strip_product_suffix(&item.tool, SET_PRODUCT_PREFIX, products) {
            items.push(PlanItem {
                tool: "set_product_type".to_string(),
                tool_input: serde_json::json!({ "product_type": product }),
            });
            continue;
        }

        if !TASK_ACTIONS.contains(&item.tool.as_str()) {
            return None;
        }

        let tool_input = match (item.tool_input, item.direct_response) {
            (Value::Object(mut map), Some(text)) => {
                map.insert("direct_response".to_string(), Value::String(text));
                Value::Object(map)
            }
            (Value::Null, Some(text)) => serde_json::json!({ "direct_response": text }),
            (other, _) => other,
        };
        items.push(PlanItem {
            tool: item.tool,
            tool_input,
        });
    }
    Some(items)
}
