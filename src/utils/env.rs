const PREFIX: &str = "BULWARK_";

/// Read `BULWARK_{key}`, falling back to plain `{key}`
///
/// The fallback lets platform-provided variables such as `PORT` work
/// without renaming.
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("{PREFIX}{key}"))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Read a boolean flag, treating anything but `true` (any case) as `false`
pub fn get_env_flag(key: &str) -> Option<bool> {
    get_env_with_prefix(key).map(|value| value.trim().eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_value_wins() {
        unsafe {
            std::env::set_var("BULWARK_ENV_TEST_PREFIXED", "prefixed");
            std::env::set_var("ENV_TEST_PREFIXED", "plain");
        }
        assert_eq!(get_env_with_prefix("ENV_TEST_PREFIXED"), Some("prefixed".to_string()));
        unsafe {
            std::env::remove_var("BULWARK_ENV_TEST_PREFIXED");
            std::env::remove_var("ENV_TEST_PREFIXED");
        }
    }

    #[test]
    fn test_unprefixed_fallback() {
        unsafe {
            std::env::set_var("ENV_TEST_FALLBACK", "plain");
        }
        assert_eq!(get_env_with_prefix("ENV_TEST_FALLBACK"), Some("plain".to_string()));
        unsafe {
            std::env::remove_var("ENV_TEST_FALLBACK");
        }

        assert_eq!(get_env_with_prefix("ENV_TEST_MISSING"), None);
    }

    #[test]
    fn test_flag() {
        unsafe {
            std::env::set_var("BULWARK_ENV_TEST_FLAG", "TRUE");
            std::env::set_var("BULWARK_ENV_TEST_OFF", "1");
        }
        assert_eq!(get_env_flag("ENV_TEST_FLAG"), Some(true));
        assert_eq!(get_env_flag("ENV_TEST_OFF"), Some(false));
        assert_eq!(get_env_flag("ENV_TEST_UNSET"), None);
        unsafe {
            std::env::remove_var("BULWARK_ENV_TEST_FLAG");
            std::env::remove_var("BULWARK_ENV_TEST_OFF");
        }
    }
}
