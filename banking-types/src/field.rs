//! `FieldSpec` and `Choice` — one slot the scenario wants to collect.

use serde::{Deserialize, Serialize};

/// The declared type of a slot's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free-form text (name, address, email).
    Text,
    /// A bounded integer, usually in 만원 units.
    Number,
    /// A yes/no toggle.
    Boolean,
    /// One of `FieldSpec::choices`.
    Choice,
}

/// One entry in a choice-valued field. Either a bare string (the stored
/// value doubles as the display string) or a full record with a distinct
/// display string, deterministic-match keywords, and a default flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Choice {
    /// A bare string: `value == display`, no keywords.
    Bare(String),
    /// A full choice record.
    Full {
        /// What ends up in `collected_info` when this choice is picked.
        value: String,
        /// What the UI shows for this choice.
        display: String,
        /// Deterministic-match keywords fed to the entity extractor's fast path.
        #[serde(default)]
        keywords: Vec<String>,
        /// Whether this is the value assumed when the user assents
        /// without specifying ("네 그걸로 할게요").
        #[serde(default)]
        default: bool,
        /// Free-form extra data passed through to the UI untouched.
        #[serde(default)]
        metadata: serde_json::Value,
    },
}

impl Choice {
    /// The value stored in `collected_info` when this choice is selected.
    pub fn value(&self) -> &str {
        match self {
            Choice::Bare(s) => s,
            Choice::Full { value, .. } => value,
        }
    }

    /// The string shown to the user in the UI.
    pub fn display(&self) -> &str {
        match self {
            Choice::Bare(s) => s,
            Choice::Full { display, .. } => display,
        }
    }

    /// Deterministic-match keywords, empty for a bare choice.
    pub fn keywords(&self) -> &[String] {
        match self {
            Choice::Bare(_) => &[],
            Choice::Full { keywords, .. } => keywords,
        }
    }

    /// Whether this choice is the scenario's declared default.
    pub fn is_default(&self) -> bool {
        matches!(self, Choice::Full { default: true, .. })
    }
}

/// A mini-expression over `collected_info` controlling field visibility.
/// Stored here as the raw source string; parsed and evaluated by
/// [`crate::show_when`], shared by the scenario engine's completion
/// check and the slot-visibility projector.
pub type ShowWhenSource = String;

/// One slot the scenario wants to collect from the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Unique key within the scenario.
    pub key: String,
    /// Human-readable label shown in the UI.
    pub display_name: String,
    /// Declared value type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the stage considers this field mandatory for completion.
    pub required: bool,
    /// Valid choices, present iff `field_type == Choice`.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Display unit for `Number` fields (e.g. "만원").
    #[serde(default)]
    pub unit: Option<String>,
    /// Free-form description surfaced to the entity-extraction LLM prompt.
    #[serde(default)]
    pub description: Option<String>,
    /// Mini-expression controlling visibility; `None` means always visible
    /// wherever the per-stage allow-list includes this key.
    #[serde(default)]
    pub show_when: Option<ShowWhenSource>,
    /// Parent field key for hierarchical display (e.g. a sub-field of a
    /// boolean "use X" toggle).
    #[serde(default)]
    pub parent_field: Option<String>,
    /// Value assumed if the user assents without specifying.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    /// Field-group id this field belongs to.
    pub group: String,
}

/// A named grouping of field keys, used by the group-collect stage mode
/// and by the slot-visibility projector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldGroup {
    /// Unique group id.
    pub id: String,
    /// Human-readable group name.
    pub name: String,
    /// Field keys in display order.
    pub field_keys: Vec<String>,
}
