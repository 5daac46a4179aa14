//! Metadata describing which interception mechanisms exist.
//!
//! Consumed by the CLI for help output and flag validation. The query
//! server itself never looks at it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Where the builtin extension images come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    pub image_registry: String,
    pub version: String,
    pub cloud_host: String,
    pub cloud_port: u16,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            image_registry: "docker.io/datawire".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            cloud_host: "app.getambassador.io".to_string(),
            cloud_port: 443,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionInfo {
    pub image: String,
    #[serde(default)]
    pub requires_api_key_or_license: bool,
    pub mechanisms: BTreeMap<String, MechanismInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MechanismInfo {
    /// Higher wins when several mechanisms could serve an intercept.
    #[serde(default)]
    pub preference: i64,
    #[serde(default)]
    pub flags: BTreeMap<String, FlagInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagInfo {
    /// Flag type tag, e.g. `string`, `stringArray` or `bool`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    pub usage: String,
}

impl FlagInfo {
    fn new(kind: &str, usage: &str) -> Self {
        Self {
            kind: kind.to_string(),
            default: None,
            usage: usage.to_string(),
        }
    }
}

/// Extensions compiled into the tool. Their names contain a `/` so they can
/// never clash with an installed extension.
pub fn builtin_extensions(config: &RegistryConfig) -> BTreeMap<String, ExtensionInfo> {
    let version = config.version.trim_start_matches('v');
    let image = format!("{}/tel2:{}", config.image_registry, version);
    // TODO: bracket IPv6 cloud hosts once the registry config accepts them.
    let ext_image = format!("grpc+https://{}:{}", config.cloud_host, config.cloud_port);

    let mut http_flags = BTreeMap::new();
    http_flags.insert(
        "match".to_string(),
        FlagInfo {
            default: Some(json!(["auto"])),
            ..FlagInfo::new(
                "stringArray",
                "Only intercept traffic that matches this \"HTTP2_HEADER=REGEXP\" specifier. \
                 Instead of a \"--http-match=HTTP2_HEADER=REGEXP\" pair, you may say \"--http-match=auto\", \
                 which will automatically select a unique matcher for your intercept. \
                 Alternatively, you may say \"--http-match=all\", which is a no-op, but will inhibit \
                 the default \"--http-match=auto\" when you are logged in. \
                 If this flag is given multiple times, then it will only intercept traffic that \
                 matches *all* of the specifiers. (default \"auto\" if you are logged in, \
                 default \"all\" otherwise)",
            )
        },
    );
    http_flags.insert(
        "path-equal".to_string(),
        FlagInfo::new(
            "string",
            "Only intercept traffic with paths that are exactly equal to this path once the query string is removed",
        ),
    );
    http_flags.insert(
        "path-prefix".to_string(),
        FlagInfo::new(
            "string",
            "Only intercept traffic with paths beginning with this prefix",
        ),
    );
    http_flags.insert(
        "path-regex".to_string(),
        FlagInfo::new(
            "string",
            "Only intercept traffic with paths that are entirely matched by this regular expression once the query string is removed",
        ),
    );
    http_flags.insert(
        "meta".to_string(),
        FlagInfo::new(
            "stringArray",
            "Associates key=value pairs with the intercept that can later be retrieved using the intercept-info endpoint",
        ),
    );
    http_flags.insert(
        "plaintext".to_string(),
        FlagInfo::new(
            "bool",
            "Use plaintext format when communicating with the interceptor process on the local workstation. \
             Only meaningful when the workload is annotated to inject an originating TLS secret",
        ),
    );

    let mut extensions = BTreeMap::new();
    extensions.insert(
        "/builtin/telepresence".to_string(),
        ExtensionInfo {
            image,
            requires_api_key_or_license: false,
            mechanisms: BTreeMap::from([("tcp".to_string(), MechanismInfo::default())]),
        },
    );
    extensions.insert(
        "/builtin/ambassador".to_string(),
        ExtensionInfo {
            image: ext_image,
            requires_api_key_or_license: true,
            mechanisms: BTreeMap::from([(
                "http".to_string(),
                MechanismInfo {
                    preference: 100,
                    flags: http_flags,
                },
            )]),
        },
    );
    extensions
}
