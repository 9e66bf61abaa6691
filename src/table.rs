use std::collections::HashSet;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::match_store::{FixtureKey, MatchKey, Outcome};

/// Value written into a column a row was derived without.
pub const SCHEMA_FILL: f64 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub key: MatchKey,
    pub result: Outcome,
    pub home_goals: u32,
    pub away_goals: u32,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDrift {
    // Columns the incoming rows lacked and received `SCHEMA_FILL`.
    pub filled_in_incoming: Vec<String>,
    // Columns the existing rows lacked and received `SCHEMA_FILL`.
    pub filled_in_existing: Vec<String>,
}

impl SchemaDrift {
    pub fn is_empty(&self) -> bool {
        self.filled_in_incoming.is_empty() && self.filled_in_existing.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: FeatureRow) -> Result<(), PipelineError> {
        if row.values.len() != self.columns.len() {
            return Err(PipelineError::RowWidth {
                key: row.key,
                expected: self.columns.len(),
                got: row.values.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r.values[col])
    }

    pub fn row_by_key(&self, key: &MatchKey) -> Option<&FeatureRow> {
        self.rows.iter().find(|r| r.key == *key)
    }

    pub fn value_by_key(&self, key: &MatchKey, column: &str) -> Option<f64> {
        let col = self.column_index(column)?;
        self.row_by_key(key).map(|r| r.values[col])
    }

    pub fn fixture_keys(&self) -> HashSet<FixtureKey> {
        self.rows.iter().map(|r| r.key.fixture()).collect()
    }

    pub fn retain(&mut self, keep: impl FnMut(&FeatureRow) -> bool) {
        self.rows.retain(keep);
    }

    /// Re-lays rows onto `columns` by name. Columns the table lacks get
    /// `SCHEMA_FILL`; callers pass a superset (see `union_columns`) so no
    /// column is ever dropped.
    pub fn with_columns(&self, columns: &[String]) -> FeatureTable {
        let mapping: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| FeatureRow {
                values: mapping
                    .iter()
                    .map(|idx| idx.map(|i| row.values[i]).unwrap_or(SCHEMA_FILL))
                    .collect(),
                ..row.clone()
            })
            .collect();
        FeatureTable {
            columns: columns.to_vec(),
            rows,
        }
    }

    /// Appends `incoming` under the union of both column sets (existing order
    /// first). Existing values are never rewritten, only widened.
    pub fn append(&mut self, incoming: FeatureTable) -> SchemaDrift {
        let drift = schema_drift(&self.columns, &incoming.columns);
        if !drift.is_empty() {
            warn!(
                "feature schema drift: {} column(s) filled in new rows, {} in existing rows",
                drift.filled_in_incoming.len(),
                drift.filled_in_existing.len()
            );
        }
        let columns = union_columns(&self.columns, &incoming.columns);
        if columns != self.columns {
            *self = self.with_columns(&columns);
        }
        let incoming = if incoming.columns == columns {
            incoming
        } else {
            incoming.with_columns(&columns)
        };
        self.rows.extend(incoming.rows);
        drift
    }
}

pub fn union_columns(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut out = existing.to_vec();
    let seen: HashSet<&String> = existing.iter().collect();
    out.extend(incoming.iter().filter(|c| !seen.contains(c)).cloned());
    out
}

pub fn schema_drift(existing: &[String], incoming: &[String]) -> SchemaDrift {
    let existing_set: HashSet<&String> = existing.iter().collect();
    let incoming_set: HashSet<&String> = incoming.iter().collect();
    SchemaDrift {
        filled_in_incoming: existing
            .iter()
            .filter(|c| !incoming_set.contains(c))
            .cloned()
            .collect(),
        filled_in_existing: incoming
            .iter()
            .filter(|c| !existing_set.contains(c))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(day: u32, values: Vec<f64>) -> FeatureRow {
        FeatureRow {
            key: MatchKey {
                season: 2019,
                date: NaiveDate::from_ymd_opt(2019, 8, day).unwrap(),
                home_team: "A".to_string(),
                away_team: "B".to_string(),
            },
            result: Outcome::Draw,
            home_goals: 0,
            away_goals: 0,
            values,
        }
    }

    #[test]
    fn push_rejects_wrong_width() {
        let mut table = FeatureTable::new(cols(&["x", "y"]));
        assert!(table.push(row(1, vec![1.0, 2.0])).is_ok());
        assert!(matches!(
            table.push(row(2, vec![1.0])),
            Err(PipelineError::RowWidth { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn append_unions_columns_and_fills() {
        let mut existing = FeatureTable::new(cols(&["x", "y"]));
        existing.push(row(1, vec![1.0, 2.0])).unwrap();
        let mut incoming = FeatureTable::new(cols(&["y", "z"]));
        incoming.push(row(2, vec![5.0, 6.0])).unwrap();

        let drift = existing.append(incoming);
        assert_eq!(drift.filled_in_incoming, cols(&["x"]));
        assert_eq!(drift.filled_in_existing, cols(&["z"]));
        assert_eq!(existing.columns(), cols(&["x", "y", "z"]).as_slice());
        assert_eq!(existing.rows()[0].values, vec![1.0, 2.0, SCHEMA_FILL]);
        assert_eq!(existing.rows()[1].values, vec![SCHEMA_FILL, 5.0, 6.0]);
    }

    #[test]
    fn with_columns_reorders_by_name() {
        let mut table = FeatureTable::new(cols(&["x", "y"]));
        table.push(row(1, vec![1.0, 2.0])).unwrap();
        let wide = table.with_columns(&cols(&["y", "w", "x"]));
        assert_eq!(wide.rows()[0].values, vec![2.0, SCHEMA_FILL, 1.0]);
        assert_eq!(wide.value(0, "x"), Some(1.0));
        assert_eq!(wide.value(0, "missing"), None);
    }
}
