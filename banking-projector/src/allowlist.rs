//! Per-stage allow-list and service-gated filtering (§4.8).
//!
//! The allow-list itself is the scenario's own data: `Stage::visible_groups`
//! names the field-group ids exposed while that stage is active, and
//! `Scenario::field_groups` maps each group id to its field keys.

use std::collections::{HashMap, HashSet};

use banking_types::{CollectedValue, FieldSpec, Scenario, Stage};

/// `services_selected` choice values recognized by service-gated
/// filtering, and the field-group ids each one unlocks.
fn service_field_groups(service: &str) -> &'static [&'static str] {
    match service {
        "all" => &["basic_info", "electronic_banking", "check_card"],
        "mobile_only" => &["basic_info", "electronic_banking"],
        "card_only" => &["basic_info", "check_card"],
        "account_only" => &["basic_info"],
        _ => &[],
    }
}

fn group_keys(scenario: &Scenario, group_id: &str) -> impl Iterator<Item = &str> {
    scenario
        .field_groups
        .iter()
        .find(|g| g.id == group_id)
        .into_iter()
        .flat_map(|g| g.field_keys.iter().map(String::as_str))
}

/// Sub-field keys gated by a "use X" boolean toggle that is currently
/// `true` (§4.8: "the corresponding sub-fields become visible even if
/// not in the current stage's allow-list").
fn unlocked_by_toggles<'a>(fields: &'a [FieldSpec], collected_info: &'a HashMap<String, CollectedValue>) -> HashSet<&'a str> {
    fields
        .iter()
        .filter(|f| {
            f.parent_field
                .as_deref()
                .and_then(|parent| collected_info.get(parent))
                .is_some_and(CollectedValue::as_bool)
        })
        .map(|f| f.key.as_str())
        .collect()
}

/// Compute the set of field keys the UI should consider for `stage`,
/// before per-field `show_when` evaluation.
pub fn allowed_keys<'a>(scenario: &'a Scenario, stage: &'a Stage, collected_info: &'a HashMap<String, CollectedValue>) -> HashSet<&'a str> {
    let mut keys: HashSet<&str> = stage.visible_groups.iter().flat_map(|g| group_keys(scenario, g)).collect();

    // Fields already collected remain visible once their stage has passed.
    keys.extend(collected_info.keys().map(String::as_str));

    keys.extend(unlocked_by_toggles(&scenario.required_info_fields, collected_info));

    if let Some(CollectedValue::Choice(service) | CollectedValue::Text(service)) = collected_info.get("services_selected") {
        let allowed_groups: HashSet<&str> = service_field_groups(service).iter().copied().collect();
        if !allowed_groups.is_empty() {
            let service_keys: HashSet<&str> = allowed_groups.iter().flat_map(|g| group_keys(scenario, g)).collect();
            keys.retain(|k| service_keys.contains(k) || collected_info.contains_key(*k));
        }
    }

    keys
}
