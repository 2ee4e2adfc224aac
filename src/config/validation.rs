use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn env_reference() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env reference pattern compiles"))
}

/// Expand `${VAR_NAME}` references using `lookup`. Unknown variables are
/// left as written.
pub fn expand_env_var_in_string_with<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env_reference()
        .replace_all(value, |cap: &regex::Captures| {
            lookup(&cap[1]).unwrap_or_else(|| cap[0].to_string())
        })
        .into_owned()
}

/// Expand environment variables in every value of a map.
pub fn expand_env_vars<F>(vars: &HashMap<String, String>, lookup: F) -> HashMap<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    vars.iter()
        .map(|(key, value)| (key.clone(), expand_env_var_in_string_with(value, &lookup)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "ATLAS_USER" => Some("reporting".to_string()),
            "ATLAS_HOST" => Some("cluster0.example.net".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_expands_known_variables() {
        let value = "mongodb+srv://${ATLAS_USER}@${ATLAS_HOST}/";
        assert_eq!(
            expand_env_var_in_string_with(value, lookup),
            "mongodb+srv://reporting@cluster0.example.net/"
        );
    }

    #[test]
    fn test_leaves_unknown_variables() {
        assert_eq!(
            expand_env_var_in_string_with("${MISSING}-x", lookup),
            "${MISSING}-x"
        );
    }

    #[test]
    fn test_expand_map() {
        let mut vars = HashMap::new();
        vars.insert("MDB_MCP_READ_ONLY".to_string(), "true".to_string());
        vars.insert("MDB_MCP_API_CLIENT_ID".to_string(), "${ATLAS_USER}".to_string());
        let expanded = expand_env_vars(&vars, lookup);
        assert_eq!(expanded["MDB_MCP_READ_ONLY"], "true");
        assert_eq!(expanded["MDB_MCP_API_CLIENT_ID"], "reporting");
    }
}
