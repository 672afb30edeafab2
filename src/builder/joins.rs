use serde::{Deserialize, Serialize};

/// One endpoint of a join rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSide {
    pub db: String,
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl JoinSide {
    pub fn new(db: &str, schema: &str, table: &str, column: &str) -> Self {
        Self {
            db: db.to_string(),
            schema: schema.to_string(),
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinType {
    Inner,
}

/// A join between two selected columns. Rules are kept in insertion order and
/// are not validated against the selection at mutation time; stale endpoints
/// surface as warnings instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinRule {
    #[serde(rename = "type")]
    pub join_type: JoinType,
    pub left: JoinSide,
    pub right: JoinSide,
}

impl JoinRule {
    pub fn inner(left: JoinSide, right: JoinSide) -> Self {
        Self {
            join_type: JoinType::Inner,
            left,
            right,
        }
    }

    pub fn sides(&self) -> [&JoinSide; 2] {
        [&self.left, &self.right]
    }

    pub fn touches_db(&self, db: &str) -> bool {
        self.left.db == db || self.right.db == db
    }
}
