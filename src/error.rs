use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// The MCP server could not be reached, or no session is open.
    Connection(String),
    /// A natural-language query or a direct tool call failed.
    Query(String),
    Config(String),
    Api {
        status: u16,
        message: String,
    },
    Mcp {
        code: i64,
        message: String,
    },
    ConnectionClosed,
    Timeout(String),
    Network(reqwest::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    Other(String),
}

impl Error {
    pub fn not_connected() -> Self {
        Error::Connection("Not connected. Call connect() first.".to_string())
    }

    /// Wrap a failure that happened while establishing the session.
    pub fn connect_failed(cause: impl fmt::Display) -> Self {
        Error::Connection(format!("Failed to connect to MCP server: {}", cause))
    }

    /// Wrap a failure that happened while answering a prompt.
    pub fn query_failed(cause: impl fmt::Display) -> Self {
        Error::Query(format!("Query execution failed: {}", cause))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::ConnectionClosed)
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Error::Query(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(msg) => write!(f, "{}", msg),
            Error::Query(msg) => write!(f, "{}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Api { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            Error::Mcp { code, message } => write!(f, "MCP error {}: {}", code, message),
            Error::ConnectionClosed => write!(f, "MCP server closed the connection"),
            Error::Timeout(what) => write!(f, "Timed out waiting for {}", what),
            Error::Network(e) => write!(f, "Network error: {}", e),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::Yaml(e) => write!(f, "YAML error: {}", e),
            Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Network(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Yaml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Config(format!("{:#}", err))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(Error::not_connected().is_connection());
        assert!(Error::ConnectionClosed.is_connection());
        assert!(Error::query_failed("boom").is_query());
        assert!(!Error::Timeout("tools/call".into()).is_query());
    }

    #[test]
    fn test_wrapped_messages() {
        assert_eq!(
            Error::not_connected().to_string(),
            "Not connected. Call connect() first."
        );
        assert_eq!(
            Error::connect_failed(Error::ConnectionClosed).to_string(),
            "Failed to connect to MCP server: MCP server closed the connection"
        );
        let err = Error::query_failed(Error::Api {
            status: 401,
            message: "invalid x-api-key".into(),
        });
        assert_eq!(
            err.to_string(),
            "Query execution failed: API error (status 401): invalid x-api-key"
        );
    }
}
