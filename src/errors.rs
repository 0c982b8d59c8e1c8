use std::{fmt, io, str::Utf8Error};
use quick_xml::events::attributes::AttrError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Xml,
    Json,
    Config,
    /// A source element is missing a required attribute or carries one that
    /// cannot be parsed. Fatal for the whole run.
    MalformedElement,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }

    /// Reports a broken element with enough context to find it in the source file.
    pub fn malformed(element: &str, id: Option<&str>, position: usize, reason: impl fmt::Display) -> Self {
        let message = match id {
            Some(id) => format!("{element} {id} at byte {position}: {reason}"),
            None => format!("{element} at byte {position}: {reason}"),
        };
        Error::new(ErrorKind::MalformedElement, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::new(ErrorKind::Io, value.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(value: quick_xml::Error) -> Self {
        Error::new(ErrorKind::Xml, value.to_string())
    }
}

impl From<AttrError> for Error {
    fn from(value: AttrError) -> Self {
        Error::new(ErrorKind::Xml, value.to_string())
    }
}

impl From<Utf8Error> for Error {
    fn from(value: Utf8Error) -> Self {
        Error::new(ErrorKind::Xml, value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::new(ErrorKind::Json, value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
