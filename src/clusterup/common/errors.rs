use std::fmt::Display;
use std::{fmt, io, result};

#[derive(Debug, PartialEq, Eq)]
pub struct Error {
    err: Box<ErrorKind>, // use a Box to keep the Result type smaller
}

/// CommandError is a reply from the server with ok: 0
#[derive(Debug, Clone)]
pub struct CommandError {
    pub code: i32,
    pub code_name: String,
    pub message: String,
}

impl CommandError {
    pub fn new<S: ToString>(code: i32, code_name: S, message: S) -> Self {
        CommandError {
            code,
            code_name: code_name.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ErrorKind {
    Timeout,
    StringError(String),
    IOError(io::Error),
    YAMLError(serde_yaml::Error),
    CommandError(CommandError),
    DriverError(mongodb::error::Error),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub fn new<S: ToString>(s: S) -> Self {
        Error {
            err: Box::new(ErrorKind::StringError(s.to_string())),
        }
    }

    pub fn timeout() -> Self {
        Error {
            err: Box::new(ErrorKind::Timeout),
        }
    }

    pub fn command(code: i32, code_name: &str, message: &str) -> Self {
        Error {
            err: Box::new(ErrorKind::CommandError(CommandError::new(code, code_name, message))),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.err
    }

    /// is_command_code returns true if this is a server reply with the given error code
    pub fn is_command_code(&self, code: i32) -> bool {
        match self.kind() {
            ErrorKind::CommandError(e) => e.code == code,
            _ => false,
        }
    }
}

impl std::error::Error for Error {}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error {
            err: Box::new(ErrorKind::StringError(String::from(err))),
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error {
            err: Box::new(ErrorKind::StringError(err)),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error {
            err: Box::new(ErrorKind::IOError(err)),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error {
            err: Box::new(ErrorKind::YAMLError(err)),
        }
    }
}

impl From<mongodb::error::Error> for Error {
    fn from(err: mongodb::error::Error) -> Self {
        // Unwrap server replies so callers can match on the error code
        if let mongodb::error::ErrorKind::Command(ref e) = *err.kind {
            return Error::command(e.code, &e.code_name, &e.message);
        }
        Error {
            err: Box::new(ErrorKind::DriverError(err)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        std::fmt::Display::fmt(&self.err, f)
    }
}

impl Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "command failed ({} {}): {}", self.code, self.code_name, self.message)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Timeout => f.write_str("operation timed out"),
            ErrorKind::StringError(s) => f.write_str(&s),
            ErrorKind::IOError(e) => std::fmt::Display::fmt(&e, f),
            ErrorKind::YAMLError(e) => std::fmt::Display::fmt(&e, f),
            ErrorKind::CommandError(e) => std::fmt::Display::fmt(&e, f),
            ErrorKind::DriverError(e) => std::fmt::Display::fmt(&e, f),
        }
    }
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl Eq for ErrorKind {}
