//! Typed, name-addressed access to one query result row.
//!
//! The accessors coerce loosely, in the spirit of the JDBC getters the
//! TikTok schema was written against: integers read as strings render as
//! decimal text, numeric text read as an integer is parsed, and NULL reads as
//! `""` or `0`. Unlike the SQLite JDBC driver, text that is not a number is
//! not read as `0`: it is an error, as are a missing column and a blob read
//! as an integer. All of these come back as
//! [`ExtractError::Query`](crate::error::ExtractError::Query).

use rusqlite::types::{Type, ValueRef};
use rusqlite::Row;

use crate::error::Result;

/// Wraps a single `rusqlite::Row`
pub struct RowCursor<'a, 'stmt> {
    row: &'a Row<'stmt>,
}

impl<'a, 'stmt> RowCursor<'a, 'stmt> {
    /// Wrap a row
    #[must_use]
    pub const fn new(row: &'a Row<'stmt>) -> Self {
        Self { row }
    }

    /// Column value as text
    pub fn get_string(&self, column: &str) -> Result<String> {
        let value = match self.row.get_ref(column)? {
            ValueRef::Null => String::new(),
            ValueRef::Integer(i) => i.to_string(),
            ValueRef::Real(f) => f.to_string(),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                String::from_utf8_lossy(bytes).into_owned()
            }
        };
        Ok(value)
    }

    /// Column value as a 64-bit integer
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_long(&self, column: &str) -> Result<i64> {
        let index = self.row.as_ref().column_index(column)?;
        let value = match self.row.get_ref(index)? {
            ValueRef::Null => 0,
            ValueRef::Integer(i) => i,
            ValueRef::Real(f) => f as i64,
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .ok_or_else(|| {
                    rusqlite::Error::InvalidColumnType(index, column.to_string(), Type::Text)
                })?,
            ValueRef::Blob(_) => {
                return Err(
                    rusqlite::Error::InvalidColumnType(index, column.to_string(), Type::Blob)
                        .into(),
                )
            }
        };
        Ok(value)
    }

    /// Column value as a 32-bit integer
    pub fn get_int(&self, column: &str) -> Result<i32> {
        let value = self.get_long(column)?;
        i32::try_from(value).map_err(|_| {
            let index = self.row.as_ref().column_index(column).unwrap_or_default();
            rusqlite::Error::IntegralValueOutOfRange(index, value).into()
        })
    }
}
