use serde::{Deserialize, Serialize};

use crate::domain::auth::Role;
use crate::domain::types::{HexColor, StatusId, StatusLabel};

pub const DEFAULT_STATUS_LABEL: &str = "New";

/// Configurable pipeline stage.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeadStatus {
    pub id: StatusId,
    pub label: StatusLabel,
    pub hex_color: HexColor,
    pub order_index: i32,
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewLeadStatus {
    pub label: StatusLabel,
    pub hex_color: HexColor,
    pub order_index: i32,
}

/// Maps legacy spellings onto the label counters are keyed by.
///
/// Blank labels count as `New` and the historical misspelling `Transfered`
/// counts as `Transferred`.
pub fn canonical_label(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return DEFAULT_STATUS_LABEL.to_string();
    }
    if trimmed.eq_ignore_ascii_case("transfered") {
        return "Transferred".to_string();
    }
    trimmed.to_string()
}

/// Conversion agents do not see upsale or transfer stages.
pub fn is_hidden_for(role: Role, label: &str) -> bool {
    if role != Role::Conversion {
        return false;
    }
    let normalized: String = label
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    normalized.contains("upsale") || normalized.contains("transfer")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_label_fixes_legacy_spelling() {
        assert_eq!(canonical_label("Transfered"), "Transferred");
        assert_eq!(canonical_label("  "), "New");
        assert_eq!(canonical_label(" Call Back "), "Call Back");
    }

    #[test]
    fn conversion_role_hides_upsale_and_transfer() {
        assert!(is_hidden_for(Role::Conversion, "Up Sale"));
        assert!(is_hidden_for(Role::Conversion, "Transferred"));
        assert!(!is_hidden_for(Role::Conversion, "New"));
        assert!(!is_hidden_for(Role::Retention, "Upsale"));
    }
}
