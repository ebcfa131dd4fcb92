use serde::{Deserialize, Serialize};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a failure surfaced by a command handler.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The data directory or `config.json` is missing or invalid.
    Config,
    /// A SQLite operation failed, including constraint violations.
    Database,
    /// The arguments supplied by the user were invalid.
    Request,
    /// A file system operation failed.
    Filesystem,
    /// Anything else.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// Attaches an `ErrorType` to a result before it is returned from a public command handler.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| e.into().context(format!("{error_type} error")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pub_result_adds_category() {
        let r: std::result::Result<(), Error> = Err(anyhow::anyhow!("disk on fire"));
        let e = r.pub_result(ErrorType::Filesystem).unwrap_err();
        assert_eq!(e.to_string(), "filesystem error");
        assert_eq!(format!("{e:#}"), "filesystem error: disk on fire");
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::Database.to_string(), "database");
        assert_eq!("config".parse::<ErrorType>().unwrap(), ErrorType::Config);
    }
}
