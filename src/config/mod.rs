pub mod database;
pub mod email;
pub mod jwt;
pub mod rate_limit;
pub mod redis;
pub mod stats;

use std::env;

/// Reads a boolean flag. Unset or unrecognised values fall back to `default`.
pub(crate) fn parse_bool_env(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .and_then(|value| parse_bool(&value))
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool(" Yes "), Some(true));
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn unrecognised_values_keep_the_default() {
        env::set_var("RUNLOG_TEST_FLAG_GARBLED", "enabled-ish");
        assert!(!parse_bool_env("RUNLOG_TEST_FLAG_GARBLED", false));
        assert!(parse_bool_env("RUNLOG_TEST_FLAG_GARBLED", true));
        assert!(!parse_bool_env("RUNLOG_TEST_FLAG_UNSET", false));
    }
}
