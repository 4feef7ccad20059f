use serde::{Deserialize, Serialize};

/// One-shot lifecycle shared by stock entries and stock adjustments.
///
/// `Draft -> Completed` is the only transition; there is no way back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentStatus {
    #[default]
    #[serde(rename = "DR")]
    Draft,
    #[serde(rename = "CO")]
    Completed,
}

impl DocumentStatus {
    /// Stable storage code.
    pub fn code(self) -> &'static str {
        match self {
            DocumentStatus::Draft => "DR",
            DocumentStatus::Completed => "CO",
        }
    }

    pub fn is_draft(self) -> bool {
        matches!(self, DocumentStatus::Draft)
    }
}

impl core::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DocumentStatus::Draft => f.write_str("draft"),
            DocumentStatus::Completed => f.write_str("completed"),
        }
    }
}
