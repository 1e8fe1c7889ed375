use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Directory entry. Owned by the external employee directory; the ledger only
/// reads it to denormalize name and designation onto each record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "employee_name": "John Doe",
        "employee_code": "EMP-001",
        "designation": "Engineer"
    })
)]
pub struct Employee {
    #[schema(example = "John Doe")]
    pub employee_name: String,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "Engineer")]
    pub designation: String,
}
