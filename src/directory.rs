use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::LedgerError;
use crate::model::employee::Employee;
use crate::store::table::{check_columns, is_blank};
use crate::store::{Row, TableBackend};

pub const COL_NAME: &str = "Employee Name";
pub const COL_CODE: &str = "Employee Code";
pub const COL_DESIGNATION: &str = "Designation";

pub const DIRECTORY_COLUMNS: [&str; 3] = [COL_NAME, COL_CODE, COL_DESIGNATION];

/// Read-only employee directory.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn lookup_by_name(&self, employee_name: &str) -> Result<Option<Employee>, LedgerError>;

    async fn lookup_by_code(&self, employee_code: &str) -> Result<Option<Employee>, LedgerError>;
}

/// Directory backed by the `Person` sheet.
pub struct TableDirectory {
    backend: Arc<dyn TableBackend>,
    table: String,
}

impl TableDirectory {
    pub fn new(backend: Arc<dyn TableBackend>, table: impl Into<String>) -> Self {
        Self {
            backend,
            table: table.into(),
        }
    }

    async fn employees(&self) -> Result<Vec<Employee>, LedgerError> {
        let rows = self.backend.read_table(&self.table).await?;
        rows.iter()
            .filter(|r| !is_blank(r))
            .map(decode_employee)
            .collect()
    }
}

fn cell(row: &Row, col: &str) -> String {
    row.get(col).map(|v| v.trim().to_string()).unwrap_or_default()
}

pub fn decode_employee(row: &Row) -> Result<Employee, LedgerError> {
    check_columns(row, &DIRECTORY_COLUMNS)?;
    Ok(Employee {
        employee_name: cell(row, COL_NAME),
        employee_code: cell(row, COL_CODE),
        designation: cell(row, COL_DESIGNATION),
    })
}

pub fn encode_employee(employee: &Employee) -> Row {
    [
        (COL_NAME.to_string(), employee.employee_name.clone()),
        (COL_CODE.to_string(), employee.employee_code.clone()),
        (COL_DESIGNATION.to_string(), employee.designation.clone()),
    ]
    .into_iter()
    .collect()
}

/// Bootstrap file for the directory sheet: `{"employees": [...]}`.
#[derive(Debug, Deserialize)]
pub struct DirectorySeed {
    pub employees: Vec<Employee>,
}

impl DirectorySeed {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn rows(&self) -> Vec<Row> {
        self.employees.iter().map(encode_employee).collect()
    }
}

#[async_trait]
impl EmployeeDirectory for TableDirectory {
    async fn lookup_by_name(&self, employee_name: &str) -> Result<Option<Employee>, LedgerError> {
        let wanted = employee_name.trim();
        Ok(self
            .employees()
            .await?
            .into_iter()
            .find(|e| e.employee_name == wanted))
    }

    async fn lookup_by_code(&self, employee_code: &str) -> Result<Option<Employee>, LedgerError> {
        let wanted = employee_code.trim();
        Ok(self
            .employees()
            .await?
            .into_iter()
            .find(|e| e.employee_code == wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemorySheet;

    fn directory() -> TableDirectory {
        let rows = vec![
            encode_employee(&Employee {
                employee_name: "John Doe".into(),
                employee_code: "EMP-001".into(),
                designation: "Engineer".into(),
            }),
            encode_employee(&Employee {
                employee_name: "Asha Rao".into(),
                employee_code: "EMP-002".into(),
                designation: "Designer".into(),
            }),
        ];
        TableDirectory::new(Arc::new(MemorySheet::new().with_table("Person", rows)), "Person")
    }

    #[actix_web::test]
    async fn lookups_in_both_directions() {
        let dir = directory();
        let by_name = dir.lookup_by_name("Asha Rao").await.unwrap().unwrap();
        assert_eq!(by_name.employee_code, "EMP-002");
        assert_eq!(by_name.designation, "Designer");

        let by_code = dir.lookup_by_code(" EMP-001 ").await.unwrap().unwrap();
        assert_eq!(by_code.employee_name, "John Doe");

        assert!(dir.lookup_by_code("EMP-999").await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn seed_file_populates_sheet() {
        let seed = DirectorySeed::from_json(
            r#"{"employees": [{"employee_name": "Ravi K", "employee_code": "EMP-010", "designation": "Analyst"}]}"#,
        )
        .unwrap();
        let dir = TableDirectory::new(Arc::new(MemorySheet::new().with_table("Person", seed.rows())), "Person");
        let found = dir.lookup_by_name("Ravi K").await.unwrap().unwrap();
        assert_eq!(found.employee_code, "EMP-010");

        assert!(DirectorySeed::from_json(r#"{"people": []}"#).is_err());
    }

    #[actix_web::test]
    async fn extra_columns_are_rejected() {
        let mut row = encode_employee(&Employee {
            employee_name: "John Doe".into(),
            employee_code: "EMP-001".into(),
            designation: "Engineer".into(),
        });
        row.insert("Salary".into(), "1".into());
        let dir = TableDirectory::new(Arc::new(MemorySheet::new().with_table("Person", vec![row])), "Person");
        assert!(matches!(dir.lookup_by_code("EMP-001").await, Err(LedgerError::Schema(_))));
    }
}
