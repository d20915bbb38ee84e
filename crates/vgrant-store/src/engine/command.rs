//! Transaction/command protocol spoken with a storage engine.
//!
//! A transaction is an ordered list of commands executed all-or-nothing.
//! Read commands declare the type of every column they return; records are
//! read back positionally.

use vgrant_core::errors::VgError;

/// How a command is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Raw statement without parameters (DDL)
    Execute,
    /// Parameterised statement that returns no rows
    Run,
    /// Parameterised query returning records
    Read,
}

/// Declared type of a result column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Int,
    Int64,
    Double,
}

/// A bound parameter or a column value
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    Null,
    String(String),
    Int(i32),
    Int64(i64),
    Double(f64),
}

impl DbValue {
    fn type_name(&self) -> &'static str {
        match self {
            DbValue::Null => "null",
            DbValue::String(_) => "string",
            DbValue::Int(_) => "int",
            DbValue::Int64(_) => "int64",
            DbValue::Double(_) => "double",
        }
    }
}

impl From<&str> for DbValue {
    fn from(v: &str) -> Self {
        DbValue::String(v.to_string())
    }
}

impl From<String> for DbValue {
    fn from(v: String) -> Self {
        DbValue::String(v)
    }
}

impl From<i32> for DbValue {
    fn from(v: i32) -> Self {
        DbValue::Int(v)
    }
}

impl From<i64> for DbValue {
    fn from(v: i64) -> Self {
        DbValue::Int64(v)
    }
}

impl From<f64> for DbValue {
    fn from(v: f64) -> Self {
        DbValue::Double(v)
    }
}

/// One statement of a transaction
#[derive(Debug, Clone, PartialEq)]
pub struct DbCommand {
    pub kind: CommandKind,
    pub sql: String,
    pub bindings: Vec<DbValue>,
    pub record_bindings: Vec<ColumnType>,
}

impl DbCommand {
    pub fn execute(sql: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::Execute,
            sql: sql.into(),
            bindings: Vec::new(),
            record_bindings: Vec::new(),
        }
    }

    pub fn run(sql: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::Run,
            ..Self::execute(sql)
        }
    }

    pub fn read(sql: impl Into<String>, record_bindings: Vec<ColumnType>) -> Self {
        Self {
            kind: CommandKind::Read,
            record_bindings,
            ..Self::execute(sql)
        }
    }

    /// Append a positional parameter
    pub fn bind(mut self, value: impl Into<DbValue>) -> Self {
        self.bindings.push(value.into());
        self
    }
}

/// Ordered commands executed atomically
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbTransaction {
    pub commands: Vec<DbCommand>,
}

impl DbTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_command(mut self, command: DbCommand) -> Self {
        self.commands.push(command);
        self
    }

    pub fn push(&mut self, command: DbCommand) {
        self.commands.push(command);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Extend<DbCommand> for DbTransaction {
    fn extend<I: IntoIterator<Item = DbCommand>>(&mut self, iter: I) {
        self.commands.extend(iter);
    }
}

/// One result row
///
/// Typed getters follow the engine convention of reading NULL as the zero
/// value of the declared type; `is_null` tells the two apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbRecord {
    pub fields: Vec<DbValue>,
}

impl DbRecord {
    pub fn new(fields: Vec<DbValue>) -> Self {
        Self { fields }
    }

    fn column(&self, index: usize) -> Result<&DbValue, VgError> {
        self.fields.get(index).ok_or(VgError::MissingColumn {
            index,
            len: self.fields.len(),
        })
    }

    fn mismatch(index: usize, expected: &'static str, found: &DbValue) -> VgError {
        VgError::ColumnType {
            index,
            expected,
            found: found.type_name(),
        }
    }

    pub fn string(&self, index: usize) -> Result<String, VgError> {
        match self.column(index)? {
            DbValue::Null => Ok(String::new()),
            DbValue::String(s) => Ok(s.clone()),
            other => Err(Self::mismatch(index, "string", other)),
        }
    }

    pub fn int(&self, index: usize) -> Result<i32, VgError> {
        match self.column(index)? {
            DbValue::Null => Ok(0),
            DbValue::Int(v) => Ok(*v),
            other => Err(Self::mismatch(index, "int", other)),
        }
    }

    pub fn int64(&self, index: usize) -> Result<i64, VgError> {
        match self.column(index)? {
            DbValue::Null => Ok(0),
            DbValue::Int64(v) => Ok(*v),
            DbValue::Int(v) => Ok(i64::from(*v)),
            other => Err(Self::mismatch(index, "int64", other)),
        }
    }

    pub fn double(&self, index: usize) -> Result<f64, VgError> {
        match self.column(index)? {
            DbValue::Null => Ok(0.0),
            DbValue::Double(v) => Ok(*v),
            other => Err(Self::mismatch(index, "double", other)),
        }
    }

    pub fn is_null(&self, index: usize) -> bool {
        matches!(self.fields.get(index), Some(DbValue::Null))
    }

    /// Every column is SQL NULL
    pub fn is_all_null(&self) -> bool {
        !self.fields.is_empty() && self.fields.iter().all(|f| *f == DbValue::Null)
    }
}

/// Outcome status reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    Error,
    /// Cancelled at its deadline and rolled back
    Timeout,
}

/// Engine reply to one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct DbResponse {
    pub status: ResponseStatus,
    /// Records of every Read command, in submission order
    pub records: Vec<DbRecord>,
    /// Engine message when status is not Ok
    pub error: Option<String>,
}

impl DbResponse {
    pub fn ok(records: Vec<DbRecord>) -> Self {
        Self {
            status: ResponseStatus::Ok,
            records,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            records: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Timeout,
            ..Self::error(message)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    pub fn is_timeout(&self) -> bool {
        self.status == ResponseStatus::Timeout
    }

    /// Engine message, or a generic one for a bare error status
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("engine returned a non-OK status")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_set_kind() {
        assert_eq!(DbCommand::execute("x").kind, CommandKind::Execute);
        assert_eq!(DbCommand::run("x").kind, CommandKind::Run);
        let read = DbCommand::read("x", vec![ColumnType::String]);
        assert_eq!(read.kind, CommandKind::Read);
        assert_eq!(read.record_bindings, vec![ColumnType::String]);
    }

    #[test]
    fn test_bind_appends_in_order() {
        let cmd = DbCommand::run("INSERT").bind("a").bind(2i64).bind(0.5);
        assert_eq!(
            cmd.bindings,
            vec![
                DbValue::String("a".into()),
                DbValue::Int64(2),
                DbValue::Double(0.5)
            ]
        );
    }

    #[test]
    fn test_null_reads_as_zero_value() {
        let record = DbRecord::new(vec![DbValue::Null, DbValue::Null]);
        assert_eq!(record.string(0).unwrap(), "");
        assert_eq!(record.int64(1).unwrap(), 0);
        assert!(record.is_null(0));
        assert!(record.is_all_null());
    }

    #[test]
    fn test_zero_is_not_null() {
        let record = DbRecord::new(vec![DbValue::Int64(0), DbValue::Null]);
        assert!(!record.is_all_null());
    }

    #[test]
    fn test_type_mismatch_and_missing_column() {
        let record = DbRecord::new(vec![DbValue::String("x".into())]);
        assert!(matches!(
            record.int64(0),
            Err(VgError::ColumnType { index: 0, .. })
        ));
        assert!(matches!(
            record.string(3),
            Err(VgError::MissingColumn { index: 3, len: 1 })
        ));
    }
}
