mod errors;

pub use self::errors::{CommandError, Error, ErrorKind, Result};
