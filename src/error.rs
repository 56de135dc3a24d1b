use crate::types::idx_or_name::IdxOrName;
use std::{error::Error, fmt::Display};

/// The kind of an xlmigrate error.
#[derive(Debug)]
pub enum XlErrorKind {
    /// An address was given both a string and a coordinate matrix
    ConflictingInput,
    /// An address was given neither a string nor a coordinate matrix
    MissingInput,
    InvalidAddress(String),
    InvalidCoordinate(String),
    IndexOutOfRange(String),
    UnsupportedSlice,
    InvalidArguments(String),
    /// Key and value header cells do not share a row: (key header address, value header address)
    MisalignedKeyValue(String, String),
    HostConnectionFailure(String),
    BookNotFound(IdxOrName),
    SheetNotFound(IdxOrName),
    InvalidPayload(String),
    CalamineError(calamine::Error),
    ExportError(String),
}

impl XlErrorKind {
    /// Run-level status reported to the host when a run aborts with this kind of error.
    pub fn exit_status(&self) -> i32 {
        match self {
            Self::HostConnectionFailure(_) => 1,
            _ => 2,
        }
    }
}

impl Display for XlErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            XlErrorKind::ConflictingInput => {
                write!(f, "conflicting input: give either an address or a matrix, not both")
            }
            XlErrorKind::MissingInput => {
                write!(f, "missing input: an address or a matrix is required")
            }
            XlErrorKind::InvalidAddress(address) => write!(f, "invalid address: {address}"),
            XlErrorKind::InvalidCoordinate(detail) => write!(f, "invalid coordinate: {detail}"),
            XlErrorKind::IndexOutOfRange(detail) => write!(f, "index out of range: {detail}"),
            XlErrorKind::UnsupportedSlice => {
                write!(f, "unsupported slice: a step can not be applied to a range")
            }
            XlErrorKind::InvalidArguments(detail) => write!(f, "invalid arguments: {detail}"),
            XlErrorKind::MisalignedKeyValue(key, value) => write!(
                f,
                "<KEY> and <VALUE> keywords are not in the same row (keys at {key}, values at {value})"
            ),
            XlErrorKind::HostConnectionFailure(detail) => write!(
                f,
                "host connection failure: {detail}; restart the spreadsheet application and retry"
            ),
            XlErrorKind::BookNotFound(idx_or_name) => {
                let message = idx_or_name.format_message();
                write!(f, "workbook {message} not found")
            }
            XlErrorKind::SheetNotFound(idx_or_name) => {
                let message = idx_or_name.format_message();
                write!(f, "worksheet {message} not found")
            }
            XlErrorKind::InvalidPayload(detail) => write!(f, "invalid payload: {detail}"),
            XlErrorKind::CalamineError(calamine_error) => {
                write!(f, "calamine error: {calamine_error}")
            }
            XlErrorKind::ExportError(detail) => write!(f, "export error: {detail}"),
        }
    }
}

/// An `xlmigrate` error.
///
/// Contains a kind and a context. Use the `Display` trait to format the
/// error message with its context.
#[derive(Debug)]
pub struct XlError {
    pub kind: XlErrorKind,
    pub context: Vec<String>,
}

pub trait ErrorContext {
    fn with_context<S: ToString, F>(self, ctx_fn: F) -> Self
    where
        F: FnOnce() -> S;
}

impl XlError {
    pub(crate) fn new(kind: XlErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
        }
    }

    pub fn exit_status(&self) -> i32 {
        self.kind.exit_status()
    }
}

impl Display for XlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{kind}", kind = self.kind)?;
        if !self.context.is_empty() {
            writeln!(f, "\nContext:")?;

            self.context
                .iter()
                .enumerate()
                .try_for_each(|(idx, ctx_value)| writeln!(f, "    {idx}: {ctx_value}"))?;
        }
        Ok(())
    }
}

impl Error for XlError {}

impl ErrorContext for XlError {
    fn with_context<S: ToString, F>(mut self, ctx_fn: F) -> Self
    where
        F: FnOnce() -> S,
    {
        self.context.push(ctx_fn().to_string());
        self
    }
}

impl From<XlErrorKind> for XlError {
    fn from(kind: XlErrorKind) -> Self {
        XlError::new(kind)
    }
}

impl From<calamine::Error> for XlError {
    fn from(err: calamine::Error) -> Self {
        XlErrorKind::CalamineError(err).into()
    }
}

impl From<serde_json::Error> for XlError {
    fn from(err: serde_json::Error) -> Self {
        XlErrorKind::InvalidPayload(err.to_string()).into()
    }
}

impl From<rust_xlsxwriter::XlsxError> for XlError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        XlErrorKind::ExportError(err.to_string()).into()
    }
}

pub type XlResult<T> = Result<T, XlError>;

impl<T> ErrorContext for XlResult<T> {
    fn with_context<S: ToString, F>(self, ctx_fn: F) -> Self
    where
        F: FnOnce() -> S,
    {
        match self {
            Ok(_) => self,
            Err(e) => Err(e.with_context(ctx_fn)),
        }
    }
}
