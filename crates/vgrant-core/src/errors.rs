use thiserror::Error;

/// Result type alias using the structured error facility
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that callers (the sync layer, the
/// rewards service) can match on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// The engine returned a non-OK status or could not be reached.
    /// Nothing destructive has happened.
    StorageUnavailable,
    /// A redemption is in flight; the backup must be retried later.
    InProgress,
    /// A restore failed after structural changes may have begun.
    /// Renamed `<table>_<timestamp>` tables hold the previous data.
    StorageError,

    // Structural/Validation
    InvalidInput,
    /// A row read back from storage does not decode into the model
    CorruptRecord,

    // Integration
    /// A transaction hit the engine deadline and was rolled back
    Timeout,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::StorageUnavailable => "ERR_STORAGE_UNAVAILABLE",
            ExErrorKind::InProgress => "ERR_IN_PROGRESS",
            ExErrorKind::StorageError => "ERR_STORAGE_ERROR",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::CorruptRecord => "ERR_CORRUPT_RECORD",
            ExErrorKind::Timeout => "ERR_TIMEOUT",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether retrying the same call later is safe
    ///
    /// Only read-side conditions qualify. A failed restore is never retried
    /// automatically: a second attempt would rename the already recreated
    /// tables again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InProgress | ExErrorKind::StorageUnavailable
        )
    }
}

/// Canonical structured error type
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    table: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            table: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context (creds_id or token_id)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add table context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the table context, if any
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(source) = &self.source {
            write!(f, " <- {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain errors raised while decoding or validating virtual grant data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VgError {
    /// Stored trigger/redeem type is outside the known range
    #[error("Unknown trigger type: {value}")]
    UnknownTriggerType { value: i64 },

    /// Stored batch status is outside the known range
    #[error("Unknown credential batch status: {value}")]
    UnknownBatchStatus { value: i64 },

    /// A name that must be spliced into DDL is not a plain identifier
    #[error("Invalid SQL identifier: {name:?}")]
    InvalidIdentifier { name: String },

    /// Restore was asked to restore nothing
    #[error("Refusing to restore an empty grant list")]
    EmptyRestore,

    /// A record had fewer columns than its declared bindings
    #[error("Column {index} missing from record with {len} columns")]
    MissingColumn { index: usize, len: usize },

    /// A column held a value of the wrong type for its binding
    #[error("Column {index} has type {found}, expected {expected}")]
    ColumnType {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// Restore state machine was asked to move somewhere it cannot go
    #[error("Illegal restore transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },
}

impl From<VgError> for ExError {
    fn from(err: VgError) -> Self {
        let kind = match &err {
            VgError::UnknownTriggerType { .. }
            | VgError::UnknownBatchStatus { .. }
            | VgError::MissingColumn { .. }
            | VgError::ColumnType { .. } => ExErrorKind::CorruptRecord,
            VgError::InvalidIdentifier { .. } | VgError::EmptyRestore => {
                ExErrorKind::InvalidInput
            }
            VgError::IllegalTransition { .. } => ExErrorKind::Internal,
        };
        ExError::new(kind).with_message(err.to_string())
    }
}
