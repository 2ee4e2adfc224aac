use crate::client::{DEFAULT_SERVER_ARGS, DEFAULT_SERVER_COMMAND};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub fn default_server_command() -> String {
    DEFAULT_SERVER_COMMAND.to_string()
}

pub fn default_server_args() -> Vec<String> {
    DEFAULT_SERVER_ARGS.iter().map(|s| s.to_string()).collect()
}

pub fn default_inherit_stderr() -> bool {
    false
}

pub fn is_default_inherit_stderr(value: &bool) -> bool {
    *value == default_inherit_stderr()
}
