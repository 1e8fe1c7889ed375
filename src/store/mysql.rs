use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::{Column, MySqlPool, Row as _};

use super::{Row, TableBackend};
use crate::error::LedgerError;

/// Sheets persisted as MySQL tables of string columns, one table per sheet.
///
/// Column names are the sheet headers verbatim (spaces included), so every
/// identifier goes through [`quote_ident`].
pub struct MySqlSheet {
    pool: MySqlPool,
}

impl MySqlSheet {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates the sheet table if it does not exist yet.
    pub async fn ensure_table(&self, table: &str, columns: &[&str]) -> Result<(), LedgerError> {
        let cols = columns
            .iter()
            .map(|c| quote_ident(c).map(|q| format!("{q} VARCHAR(255) NOT NULL DEFAULT ''")))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");

        let sql = format!("CREATE TABLE IF NOT EXISTS {} ({})", quote_ident(table)?, cols);
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }
}

fn quote_ident(name: &str) -> Result<String, LedgerError> {
    if name.is_empty() || name.contains('`') {
        return Err(LedgerError::Schema(format!("illegal identifier {name:?}")));
    }
    Ok(format!("`{name}`"))
}

#[async_trait]
impl TableBackend for MySqlSheet {
    async fn read_table(&self, table: &str) -> Result<Vec<Row>, LedgerError> {
        let sql = format!("SELECT * FROM {}", quote_ident(table)?);
        let mut stream = sqlx::query(&sql).fetch(&self.pool);

        let mut rows = Vec::new();
        while let Some(db_row) = stream.try_next().await? {
            let mut row = Row::new();
            for (i, col) in db_row.columns().iter().enumerate() {
                let cell: Option<String> = db_row.try_get(i)?;
                row.insert(col.name().to_string(), cell.unwrap_or_default());
            }
            rows.push(row);
        }

        tracing::debug!(table, rows = rows.len(), "Read sheet");
        Ok(rows)
    }

    async fn replace_table(&self, table: &str, rows: Vec<Row>) -> Result<(), LedgerError> {
        let quoted = quote_ident(table)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("DELETE FROM {quoted}"))
            .execute(&mut *tx)
            .await?;

        for row in &rows {
            let cols = row
                .keys()
                .map(|c| quote_ident(c))
                .collect::<Result<Vec<_>, _>>()?
                .join(", ");
            let marks = vec!["?"; row.len()].join(", ");
            let sql = format!("INSERT INTO {quoted} ({cols}) VALUES ({marks})");

            let mut query = sqlx::query(&sql);
            for cell in row.values() {
                query = query.bind(cell.as_str());
            }
            query.execute(&mut *tx).await?;
        }

        tx.commit().await?;
        tracing::debug!(table, rows = rows.len(), "Replaced sheet");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_with_spaces_are_quoted() {
        assert_eq!(quote_ident("Check-in Time").unwrap(), "`Check-in Time`");
    }

    #[test]
    fn backticks_cannot_escape_the_identifier() {
        assert!(quote_ident("x` ; DROP TABLE y; --").is_err());
        assert!(quote_ident("").is_err());
    }
}
