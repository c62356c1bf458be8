//! Generic record store over a single SQLite transaction
//!
//! Every service operation runs inside one [`UnitOfWork`]. The unit commits
//! only when the closure that owns it returns `Ok`; dropping it without
//! [`UnitOfWork::commit`] rolls back.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, OptionalExtension, Row, Transaction};

use crate::types::MemberError;

/// A table-backed record type
pub trait Record: Sized {
    const TABLE: &'static str;
    /// Human name used in NotFound messages
    const KIND: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Columns an update may touch
    const MUTABLE: &'static [&'static str];

    fn id(&self) -> i64;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Insert payload for a [`Record`]
pub trait Insertable {
    type Record: Record;

    fn to_fields(&self) -> FieldMap;
}

// ============================================================================
// Field maps
// ============================================================================

/// Ordered column → value pairs for INSERT and UPDATE
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap(Vec<(&'static str, Value)>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FieldMap::insert`]
    pub fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column, replacing an earlier value for the same column
    pub fn insert(&mut self, column: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.0.push((column, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(c, _)| *c)
    }

    fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }
}

// ============================================================================
// Filters and ordering
// ============================================================================

/// WHERE clause built from column equality tests
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(&'static str, Value),
    /// OR of the inner filters
    Any(Vec<Filter>),
    /// AND of the inner filters
    Every(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self::Eq(column, value.into())
    }

    fn columns(&self, out: &mut Vec<&'static str>) {
        match self {
            Self::All => {}
            Self::Eq(column, _) => out.push(column),
            Self::Any(inner) | Self::Every(inner) => {
                inner.iter().for_each(|f| f.columns(out));
            }
        }
    }

    fn to_sql(&self, params: &mut Vec<Value>) -> String {
        match self {
            Self::All => "1 = 1".to_string(),
            Self::Eq(column, value) => {
                params.push(value.clone());
                format!("{column} = ?{}", params.len())
            }
            Self::Any(inner) => Self::join(inner, " OR ", "1 = 0", params),
            Self::Every(inner) => Self::join(inner, " AND ", "1 = 1", params),
        }
    }

    fn join(inner: &[Filter], sep: &str, empty: &str, params: &mut Vec<Value>) -> String {
        if inner.is_empty() {
            return empty.to_string();
        }
        let parts: Vec<String> = inner.iter().map(|f| f.to_sql(params)).collect();
        format!("({})", parts.join(sep))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// ORDER BY keys, applied left to right
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBy(Vec<(&'static str, Direction)>);

impl OrderBy {
    pub fn asc(column: &'static str) -> Self {
        Self(vec![(column, Direction::Asc)])
    }

    pub fn desc(column: &'static str) -> Self {
        Self(vec![(column, Direction::Desc)])
    }

    pub fn then_asc(mut self, column: &'static str) -> Self {
        self.0.push((column, Direction::Asc));
        self
    }

    pub fn then_desc(mut self, column: &'static str) -> Self {
        self.0.push((column, Direction::Desc));
        self
    }

    fn to_sql(&self) -> String {
        if self.0.is_empty() {
            return "id ASC".to_string();
        }
        self.0
            .iter()
            .map(|(column, dir)| match dir {
                Direction::Asc => format!("{column} ASC"),
                Direction::Desc => format!("{column} DESC"),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ============================================================================
// Unit of work
// ============================================================================

/// Transaction-scoped access to every [`Record`] table
pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> UnitOfWork<'conn> {
    pub(crate) fn new(tx: Transaction<'conn>) -> Self {
        Self { tx }
    }

    /// Insert a new row and return it as stored
    pub fn insert<I: Insertable>(&self, new: &I) -> Result<I::Record, MemberError> {
        let fields = new.to_fields();
        check_columns::<I::Record>(fields.columns(), <I::Record as Record>::COLUMNS)?;

        let columns: Vec<&str> = fields.columns().collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            <I::Record as Record>::TABLE,
            columns.join(", "),
            placeholders.join(", ")
        );

        self.tx.execute(&sql, params_from_iter(fields.values()))?;
        let id = self.tx.last_insert_rowid();

        self.get::<I::Record>(id)?.ok_or_else(|| {
            MemberError::Internal(format!(
                "{} {id} missing right after insert",
                <I::Record as Record>::KIND
            ))
        })
    }

    /// Fetch a row by primary key
    pub fn get<R: Record>(&self, id: i64) -> Result<Option<R>, MemberError> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", R::COLUMNS.join(", "), R::TABLE);
        Ok(self.tx.query_row(&sql, [id], R::from_row).optional()?)
    }

    /// Fetch a row by primary key, or NotFound
    pub fn require<R: Record>(&self, id: i64) -> Result<R, MemberError> {
        self.get(id)?
            .ok_or_else(|| MemberError::NotFound(format!("{} not found", R::KIND)))
    }

    pub fn find<R: Record>(&self, filter: &Filter, order: &OrderBy) -> Result<Vec<R>, MemberError> {
        let mut used = Vec::new();
        filter.columns(&mut used);
        used.extend(order.0.iter().map(|(c, _)| *c));
        check_columns::<R>(used.into_iter(), R::COLUMNS)?;

        let mut params = Vec::new();
        let where_clause = filter.to_sql(&mut params);
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            R::COLUMNS.join(", "),
            R::TABLE,
            where_clause,
            order.to_sql()
        );

        let mut stmt = self.tx.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), R::from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn find_one<R: Record>(&self, filter: &Filter) -> Result<Option<R>, MemberError> {
        Ok(self.find(filter, &OrderBy::asc("id"))?.into_iter().next())
    }

    /// Overwrite the given columns of one row and return the updated row.
    ///
    /// An empty field map is a no-op read.
    pub fn update<R: Record>(&self, id: i64, fields: &FieldMap) -> Result<R, MemberError> {
        check_columns::<R>(fields.columns(), R::MUTABLE)?;

        if fields.is_empty() {
            return self.require(id);
        }

        let assignments: Vec<String> = fields
            .columns()
            .enumerate()
            .map(|(i, column)| format!("{column} = ?{}", i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            R::TABLE,
            assignments.join(", "),
            fields.len() + 1
        );

        let id_value = Value::Integer(id);
        let params = fields.values().chain(std::iter::once(&id_value));
        let changed = self.tx.execute(&sql, params_from_iter(params))?;
        if changed == 0 {
            return Err(MemberError::NotFound(format!("{} not found", R::KIND)));
        }

        self.require(id)
    }

    /// Delete one row; `false` when no such row existed
    pub fn delete<R: Record>(&self, id: i64) -> Result<bool, MemberError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", R::TABLE);
        Ok(self.tx.execute(&sql, [id])? > 0)
    }

    pub fn count<R: Record>(&self, filter: &Filter) -> Result<u64, MemberError> {
        let mut used = Vec::new();
        filter.columns(&mut used);
        check_columns::<R>(used.into_iter(), R::COLUMNS)?;

        let mut params = Vec::new();
        let where_clause = filter.to_sql(&mut params);
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {}", R::TABLE, where_clause);
        let count: i64 = self
            .tx
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn commit(self) -> Result<(), MemberError> {
        Ok(self.tx.commit()?)
    }
}

/// Column names are interpolated into SQL, so they must come from the
/// record's own column list.
fn check_columns<R: Record>(
    mut used: impl Iterator<Item = &'static str>,
    allowed: &[&str],
) -> Result<(), MemberError> {
    match used.find(|c| !allowed.contains(c)) {
        Some(column) => Err(MemberError::Internal(format!(
            "Column '{column}' is not writable or not part of {}",
            R::TABLE
        ))),
        None => Ok(()),
    }
}
