use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Leave category. The display form is what lands in the ledger's reason
/// column, e.g. `Sick Leave: fever`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    #[strum(serialize = "Sick Leave")]
    Sick,
    #[strum(serialize = "Personal Leave")]
    Personal,
    #[strum(serialize = "Vacation")]
    Vacation,
    #[strum(serialize = "Other")]
    Other,
}

impl LeaveType {
    pub fn reason_cell(&self, reason: &str) -> String {
        format!("{}: {}", self, reason.trim())
    }
}
