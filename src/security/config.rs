use super::error::ConfigError;
use crate::utils::{get_env_flag, get_env_with_prefix};
use axum::http::Uri;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Policy used for both CSP headers when none is configured.
///
/// This is strict: pages relying on inline scripts or styles will break
/// until a real policy is supplied.
pub const DEFAULT_POLICY: &str = "default-src 'self';";

/// Recognized configuration option keys
pub mod option {
    pub const CONTENT_SECURITY_POLICY: &str = "contentSecurityPolicy";
    pub const CONTENT_SECURITY_POLICY_ENABLED: &str = "contentSecurityPolicyEnabled";
    pub const CONTENT_SECURITY_POLICY_REPORT_ONLY: &str = "contentSecurityPolicyReportOnly";
    pub const CONTENT_SECURITY_POLICY_REPORT_ONLY_ENABLED: &str =
        "contentSecurityPolicyReportOnlyEnabled";
    pub const HEADER_X_CONTENT_SECURITY_POLICY_ENABLED: &str = "headerXcontentSecurityPolicyEnabled";
    pub const HEADER_X_WEBKIT_CSP_ENABLED: &str = "headerXwebkitCSPEnabled";
    pub const HSTS_ENABLED: &str = "hstsEnabled";
    pub const HSTS_MAX_AGE_SECONDS: &str = "hstsMaxAgeSeconds";
    pub const HSTS_INCLUDE_SUB_DOMAINS: &str = "hstsIncludeSubDomains";
    pub const ANTI_CLICK_JACKING_ENABLED: &str = "antiClickJackingEnabled";
    pub const ANTI_CLICK_JACKING_OPTION: &str = "antiClickJackingOption";
    pub const ANTI_CLICK_JACKING_URI: &str = "antiClickJackingUri";
    pub const BLOCK_CONTENT_TYPE_SNIFFING_ENABLED: &str = "blockContentTypeSniffingEnabled";
    pub const XSS_PROTECTION_ENABLED: &str = "xssProtectionEnabled";
}

/// Option keys paired with the environment variable suffix read by `from_env`
///
/// | Option key | Variable |
/// |---|---|
/// | `contentSecurityPolicy` | `SECURITY_CSP` |
/// | `contentSecurityPolicyEnabled` | `SECURITY_CSP_ENABLED` |
/// | `contentSecurityPolicyReportOnly` | `SECURITY_CSP_REPORT_ONLY` |
/// | `contentSecurityPolicyReportOnlyEnabled` | `SECURITY_CSP_REPORT_ONLY_ENABLED` |
/// | `headerXcontentSecurityPolicyEnabled` | `SECURITY_X_CONTENT_SECURITY_POLICY_ENABLED` |
/// | `headerXwebkitCSPEnabled` | `SECURITY_X_WEBKIT_CSP_ENABLED` |
/// | `hstsEnabled` | `SECURITY_HSTS_ENABLED` |
/// | `hstsMaxAgeSeconds` | `SECURITY_HSTS_MAX_AGE` |
/// | `hstsIncludeSubDomains` | `SECURITY_HSTS_INCLUDE_SUBDOMAINS` |
/// | `antiClickJackingEnabled` | `SECURITY_ANTI_CLICK_JACKING_ENABLED` |
/// | `antiClickJackingOption` | `SECURITY_X_FRAME_OPTIONS` |
/// | `antiClickJackingUri` | `SECURITY_X_FRAME_OPTIONS_URI` |
/// | `blockContentTypeSniffingEnabled` | `SECURITY_NOSNIFF` |
/// | `xssProtectionEnabled` | `SECURITY_XSS_PROTECTION` |
const ENV_VARS: [(&str, &str); 14] = [
    (option::CONTENT_SECURITY_POLICY, "SECURITY_CSP"),
    (option::CONTENT_SECURITY_POLICY_ENABLED, "SECURITY_CSP_ENABLED"),
    (option::CONTENT_SECURITY_POLICY_REPORT_ONLY, "SECURITY_CSP_REPORT_ONLY"),
    (option::CONTENT_SECURITY_POLICY_REPORT_ONLY_ENABLED, "SECURITY_CSP_REPORT_ONLY_ENABLED"),
    (option::HEADER_X_CONTENT_SECURITY_POLICY_ENABLED, "SECURITY_X_CONTENT_SECURITY_POLICY_ENABLED"),
    (option::HEADER_X_WEBKIT_CSP_ENABLED, "SECURITY_X_WEBKIT_CSP_ENABLED"),
    (option::HSTS_ENABLED, "SECURITY_HSTS_ENABLED"),
    (option::HSTS_MAX_AGE_SECONDS, "SECURITY_HSTS_MAX_AGE"),
    (option::HSTS_INCLUDE_SUB_DOMAINS, "SECURITY_HSTS_INCLUDE_SUBDOMAINS"),
    (option::ANTI_CLICK_JACKING_ENABLED, "SECURITY_ANTI_CLICK_JACKING_ENABLED"),
    (option::ANTI_CLICK_JACKING_OPTION, "SECURITY_X_FRAME_OPTIONS"),
    (option::ANTI_CLICK_JACKING_URI, "SECURITY_X_FRAME_OPTIONS_URI"),
    (option::BLOCK_CONTENT_TYPE_SNIFFING_ENABLED, "SECURITY_NOSNIFF"),
    (option::XSS_PROTECTION_ENABLED, "SECURITY_XSS_PROTECTION"),
];

/// X-Frame-Options header value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum FrameOption {
    /// DENY - Don't allow framing at all
    #[default]
    #[serde(rename = "DENY")]
    Deny,
    /// SAMEORIGIN - Allow framing from same origin
    #[serde(rename = "SAMEORIGIN")]
    SameOrigin,
    /// ALLOW-FROM - Allow framing from a single URI
    #[serde(rename = "ALLOW-FROM")]
    AllowFrom,
}

impl FrameOption {
    const ALL: [FrameOption; 3] = [Self::Deny, Self::SameOrigin, Self::AllowFrom];

    /// The token written into the X-Frame-Options header
    pub const fn header_token(self) -> &'static str {
        match self {
            Self::Deny => "DENY",
            Self::SameOrigin => "SAMEORIGIN",
            Self::AllowFrom => "ALLOW-FROM",
        }
    }
}

impl FromStr for FrameOption {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|option| option.header_token().eq_ignore_ascii_case(value))
            .ok_or_else(|| ConfigError::InvalidFrameOption(value.to_string()))
    }
}

impl fmt::Display for FrameOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_token())
    }
}

/// Security headers configuration
///
/// Field names in serialized form are the option keys accepted by
/// [`SecurityConfig::from_params`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// Content-Security-Policy header value, also used for the
    /// X-Content-Security-Policy and X-Webkit-CSP headers
    #[serde(rename = "contentSecurityPolicy", default = "default_policy")]
    pub csp: String,

    /// Gate for Content-Security-Policy and both deprecated variants
    #[serde(rename = "contentSecurityPolicyEnabled", default = "default_true")]
    pub csp_enabled: bool,

    #[serde(rename = "contentSecurityPolicyReportOnly", default = "default_policy")]
    pub csp_report_only: String,

    /// Gate for Content-Security-Policy-Report-Only, independent of `csp_enabled`
    #[serde(rename = "contentSecurityPolicyReportOnlyEnabled", default = "default_true")]
    pub csp_report_only_enabled: bool,

    /// X-Content-Security-Policy (IE 10/11). Only effective with `csp_enabled`
    #[serde(rename = "headerXcontentSecurityPolicyEnabled", default = "default_true")]
    pub x_content_security_policy_enabled: bool,

    /// X-Webkit-CSP (older Safari/iOS). Only effective with `csp_enabled`
    #[serde(rename = "headerXwebkitCSPEnabled", default = "default_true")]
    pub x_webkit_csp_enabled: bool,

    /// Strict-Transport-Security, sent on secure requests only
    #[serde(rename = "hstsEnabled", default = "default_true")]
    pub hsts_enabled: bool,

    /// Negative values deserialize as 0
    #[serde(
        rename = "hstsMaxAgeSeconds",
        default,
        deserialize_with = "deserialize_max_age"
    )]
    pub hsts_max_age_seconds: u64,

    #[serde(rename = "hstsIncludeSubDomains", default)]
    pub hsts_include_subdomains: bool,

    /// X-Frame-Options
    #[serde(rename = "antiClickJackingEnabled", default = "default_true")]
    pub anti_click_jacking_enabled: bool,

    #[serde(rename = "antiClickJackingOption", default)]
    pub anti_click_jacking_option: FrameOption,

    /// Framing origin for `FrameOption::AllowFrom`. Validated whenever set,
    /// but only written into the header for ALLOW-FROM
    #[serde(rename = "antiClickJackingUri", default)]
    pub anti_click_jacking_uri: Option<String>,

    /// X-Content-Type-Options: nosniff
    #[serde(rename = "blockContentTypeSniffingEnabled", default = "default_true")]
    pub block_content_type_sniffing_enabled: bool,

    /// X-XSS-Protection: 1; mode=block
    #[serde(rename = "xssProtectionEnabled", default = "default_true")]
    pub xss_protection_enabled: bool,

    /// Treat `X-Forwarded-Proto: https` as a secure request.
    /// Only enable this behind a proxy that sets the header itself.
    #[serde(skip)]
    pub trust_forwarded_proto: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            csp: default_policy(),
            csp_enabled: true,
            csp_report_only: default_policy(),
            csp_report_only_enabled: true,
            x_content_security_policy_enabled: true,
            x_webkit_csp_enabled: true,
            hsts_enabled: true,
            hsts_max_age_seconds: 0,
            hsts_include_subdomains: false,
            anti_click_jacking_enabled: true,
            anti_click_jacking_option: FrameOption::default(),
            anti_click_jacking_uri: None,
            block_content_type_sniffing_enabled: true,
            xss_protection_enabled: true,
            trust_forwarded_proto: false,
        }
    }
}

impl SecurityConfig {
    /// Create a new SecurityConfig builder
    pub fn builder() -> SecurityConfigBuilder {
        SecurityConfigBuilder::new()
    }

    /// Resolve configuration from option key/value pairs
    ///
    /// Keys not listed in [`option`] are rejected. Absent keys keep their
    /// defaults. Boolean values that are neither `true` nor `false` (in any
    /// case) are ignored with a warning.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered: an unknown key, a
    /// non-numeric `hstsMaxAgeSeconds`, an unmatched `antiClickJackingOption`,
    /// a malformed `antiClickJackingUri`, or a missing one when the option
    /// is `ALLOW-FROM`.
    pub fn from_params<I, K, V>(params: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();

        for (key, value) in params {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                option::CONTENT_SECURITY_POLICY => config.csp = value.to_string(),
                option::CONTENT_SECURITY_POLICY_ENABLED => {
                    parse_bool(key, value, &mut config.csp_enabled)
                }
                option::CONTENT_SECURITY_POLICY_REPORT_ONLY => {
                    config.csp_report_only = value.to_string()
                }
                option::CONTENT_SECURITY_POLICY_REPORT_ONLY_ENABLED => {
                    parse_bool(key, value, &mut config.csp_report_only_enabled)
                }
                option::HEADER_X_CONTENT_SECURITY_POLICY_ENABLED => {
                    parse_bool(key, value, &mut config.x_content_security_policy_enabled)
                }
                option::HEADER_X_WEBKIT_CSP_ENABLED => {
                    parse_bool(key, value, &mut config.x_webkit_csp_enabled)
                }
                option::HSTS_ENABLED => parse_bool(key, value, &mut config.hsts_enabled),
                option::HSTS_MAX_AGE_SECONDS => {
                    config.hsts_max_age_seconds = parse_max_age(value)?
                }
                option::HSTS_INCLUDE_SUB_DOMAINS => {
                    parse_bool(key, value, &mut config.hsts_include_subdomains)
                }
                option::ANTI_CLICK_JACKING_ENABLED => {
                    parse_bool(key, value, &mut config.anti_click_jacking_enabled)
                }
                option::ANTI_CLICK_JACKING_OPTION => {
                    config.anti_click_jacking_option = value.parse()?
                }
                option::ANTI_CLICK_JACKING_URI => {
                    check_uri(value)?;
                    config.anti_click_jacking_uri = Some(value.to_string())
                }
                option::BLOCK_CONTENT_TYPE_SNIFFING_ENABLED => {
                    parse_bool(key, value, &mut config.block_content_type_sniffing_enabled)
                }
                option::XSS_PROTECTION_ENABLED => {
                    parse_bool(key, value, &mut config.xss_protection_enabled)
                }
                unknown => return Err(ConfigError::UnknownOption(unknown.to_string())),
            }
        }

        // ALLOW-FROM needs a URI, but the option may come after it
        config.validate()?;

        tracing::debug!(config = ?config, "Resolved security header configuration");
        Ok(config)
    }

    /// Load security configuration from environment variables
    ///
    /// Every option key has a `BULWARK_SECURITY_*` variable (with unprefixed
    /// `SECURITY_*` fallback):
    ///
    /// | Variable | Option key |
    /// |---|---|
    /// | `BULWARK_SECURITY_CSP` | `contentSecurityPolicy` |
    /// | `BULWARK_SECURITY_CSP_ENABLED` | `contentSecurityPolicyEnabled` |
    /// | `BULWARK_SECURITY_CSP_REPORT_ONLY` | `contentSecurityPolicyReportOnly` |
    /// | `BULWARK_SECURITY_CSP_REPORT_ONLY_ENABLED` | `contentSecurityPolicyReportOnlyEnabled` |
    /// | `BULWARK_SECURITY_X_CONTENT_SECURITY_POLICY_ENABLED` | `headerXcontentSecurityPolicyEnabled` |
    /// | `BULWARK_SECURITY_X_WEBKIT_CSP_ENABLED` | `headerXwebkitCSPEnabled` |
    /// | `BULWARK_SECURITY_HSTS_ENABLED` | `hstsEnabled` |
    /// | `BULWARK_SECURITY_HSTS_MAX_AGE` | `hstsMaxAgeSeconds` |
    /// | `BULWARK_SECURITY_HSTS_INCLUDE_SUBDOMAINS` | `hstsIncludeSubDomains` |
    /// | `BULWARK_SECURITY_ANTI_CLICK_JACKING_ENABLED` | `antiClickJackingEnabled` |
    /// | `BULWARK_SECURITY_X_FRAME_OPTIONS` | `antiClickJackingOption` |
    /// | `BULWARK_SECURITY_X_FRAME_OPTIONS_URI` | `antiClickJackingUri` |
    /// | `BULWARK_SECURITY_NOSNIFF` | `blockContentTypeSniffingEnabled` |
    /// | `BULWARK_SECURITY_XSS_PROTECTION` | `xssProtectionEnabled` |
    /// | `BULWARK_SECURITY_TRUST_FORWARDED_PROTO` | (not an option key) |
    ///
    /// Values go through [`SecurityConfig::from_params`], so they are
    /// validated the same way.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let params: Vec<(&str, String)> = ENV_VARS
            .iter()
            .filter_map(|(key, var)| get_env_with_prefix(var).map(|value| (*key, value)))
            .collect();

        let mut config = Self::from_params(params)?;

        if let Some(trust) = get_env_flag("SECURITY_TRUST_FORWARDED_PROTO") {
            config.trust_forwarded_proto = trust;
        }

        Ok(config)
    }

    /// Check the settings that cannot be expressed in the field types
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUri`] for a malformed
    /// `anti_click_jacking_uri`, whatever the frame option, and
    /// [`ConfigError::MissingUri`] when `ALLOW-FROM` is selected without one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref uri) = self.anti_click_jacking_uri {
            check_uri(uri)?;
        }
        if self.anti_click_jacking_option == FrameOption::AllowFrom {
            self.allow_from_uri()?;
        }
        Ok(())
    }

    /// The ALLOW-FROM URI, exactly as configured
    pub(crate) fn allow_from_uri(&self) -> Result<&str, ConfigError> {
        self.anti_click_jacking_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .ok_or(ConfigError::MissingUri)
    }
}

/// Builder for SecurityConfig
#[must_use = "builder does nothing until you call build()"]
pub struct SecurityConfigBuilder {
    config: SecurityConfig,
}

impl SecurityConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SecurityConfig::default(),
        }
    }

    pub fn content_security_policy(mut self, policy: impl Into<String>) -> Self {
        self.config.csp = policy.into();
        self
    }

    pub fn content_security_policy_enabled(mut self, enabled: bool) -> Self {
        self.config.csp_enabled = enabled;
        self
    }

    pub fn report_only_policy(mut self, policy: impl Into<String>) -> Self {
        self.config.csp_report_only = policy.into();
        self
    }

    pub fn report_only_enabled(mut self, enabled: bool) -> Self {
        self.config.csp_report_only_enabled = enabled;
        self
    }

    pub fn x_content_security_policy(mut self, enabled: bool) -> Self {
        self.config.x_content_security_policy_enabled = enabled;
        self
    }

    pub fn x_webkit_csp(mut self, enabled: bool) -> Self {
        self.config.x_webkit_csp_enabled = enabled;
        self
    }

    pub fn hsts_enabled(mut self, enabled: bool) -> Self {
        self.config.hsts_enabled = enabled;
        self
    }

    pub fn hsts_max_age(mut self, seconds: u64) -> Self {
        self.config.hsts_max_age_seconds = seconds;
        self
    }

    pub fn hsts_include_subdomains(mut self, include: bool) -> Self {
        self.config.hsts_include_subdomains = include;
        self
    }

    pub fn anti_click_jacking(mut self, enabled: bool) -> Self {
        self.config.anti_click_jacking_enabled = enabled;
        self
    }

    pub fn deny_framing(mut self) -> Self {
        self.config.anti_click_jacking_option = FrameOption::Deny;
        self
    }

    pub fn same_origin_framing(mut self) -> Self {
        self.config.anti_click_jacking_option = FrameOption::SameOrigin;
        self
    }

    /// Allow framing from a single origin (`X-Frame-Options: ALLOW-FROM <uri>`)
    pub fn allow_from(mut self, uri: impl Into<String>) -> Self {
        self.config.anti_click_jacking_option = FrameOption::AllowFrom;
        self.config.anti_click_jacking_uri = Some(uri.into());
        self
    }

    pub fn nosniff(mut self, enabled: bool) -> Self {
        self.config.block_content_type_sniffing_enabled = enabled;
        self
    }

    pub fn xss_protection(mut self, enabled: bool) -> Self {
        self.config.xss_protection_enabled = enabled;
        self
    }

    pub fn trust_forwarded_proto(mut self, trust: bool) -> Self {
        self.config.trust_forwarded_proto = trust;
        self
    }

    pub fn build(self) -> SecurityConfig {
        self.config
    }
}

impl Default for SecurityConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_policy() -> String {
    DEFAULT_POLICY.to_string()
}

fn default_true() -> bool {
    true
}

fn parse_bool(option: &str, value: &str, target: &mut bool) {
    if value.eq_ignore_ascii_case("true") {
        *target = true;
    } else if value.eq_ignore_ascii_case("false") {
        *target = false;
    } else {
        tracing::warn!(option, value, default = *target, "Ignoring non-boolean option value");
    }
}

// An empty value counts as unset
fn check_uri(value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Ok(());
    }

    value
        .parse::<Uri>()
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidUri {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn deserialize_max_age<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = i64::deserialize(deserializer)?;
    Ok(u64::try_from(seconds).unwrap_or(0))
}

fn parse_max_age(value: &str) -> Result<u64, ConfigError> {
    let seconds: i64 = value.parse().map_err(|_| ConfigError::InvalidInteger {
        option: option::HSTS_MAX_AGE_SECONDS,
        value: value.to_string(),
    })?;

    // Negative ages are treated as zero
    Ok(u64::try_from(seconds).unwrap_or(0))
}
