use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use iqs_core::error::parse_pairs;
use iqs_core::{
    ActiveIntercepts, AgentState, CallerIdMatcher, ConfigError, FixedState, HeaderMatcher,
    Metadata, Role, WithMetadata,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Plain,
}

/// Command line of the server binary. Every flag falls back to an
/// environment variable, which may come from a `.env` file.
#[derive(Parser, Debug)]
#[command(name = "iqs-server", version, about = "Interception query service")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "IQS_LISTEN_ADDR", default_value = "127.0.0.1:9980")]
    pub listen_addr: SocketAddr,

    /// Which side answers: `client` or `cluster`
    #[arg(long, env = "IQS_ROLE", default_value = "cluster")]
    pub role: String,

    /// `always`, `never`, `headers:NAME=VALUE[,...]`, `caller:ID` or `active`
    #[arg(long, env = "IQS_POLICY", default_value = "active")]
    pub policy: String,

    /// KEY=VALUE[,...] attached to every intercepted answer
    #[arg(long, env = "IQS_METADATA")]
    pub metadata: Option<String>,

    /// Intercept ids active at startup (`active` policy only), comma separated
    #[arg(long, env = "IQS_ACTIVE")]
    pub active: Option<String>,

    /// Seconds in-flight queries may take to finish after shutdown
    #[arg(long, env = "IQS_SHUTDOWN_GRACE_SECS", default_value_t = 5)]
    pub shutdown_grace_secs: u64,

    #[arg(long, env = "IQS_LOG_FORMAT", value_enum, default_value = "json")]
    pub log_format: LogFormat,

    /// Print the OpenAPI document and exit
    #[arg(long)]
    pub print_openapi: bool,
}

/// How the bound agent decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySpec {
    Always,
    Never,
    Headers(Vec<(String, String)>),
    Caller(String),
    Active,
}

impl FromStr for PolicySpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once(':') {
            Some(("headers", pairs)) => {
                let pairs = parse_pairs(pairs)?;
                if pairs.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        name: "policy".to_string(),
                        message: "headers policy needs at least one NAME=VALUE".to_string(),
                    });
                }
                Ok(PolicySpec::Headers(pairs))
            }
            Some(("caller", id)) if !id.is_empty() => Ok(PolicySpec::Caller(id.to_string())),
            _ => match s {
                "always" => Ok(PolicySpec::Always),
                "never" => Ok(PolicySpec::Never),
                "active" => Ok(PolicySpec::Active),
                other => Err(ConfigError::UnknownPolicy(other.to_string())),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub role: Role,
    pub policy: PolicySpec,
    pub metadata: Metadata,
    pub active: Vec<String>,
    pub shutdown_grace: Duration,
}

impl TryFrom<&Args> for ServerConfig {
    type Error = ConfigError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let metadata = match args.metadata.as_deref() {
            Some(raw) => parse_pairs(raw)?.into_iter().collect(),
            None => Metadata::new(),
        };
        let active = args
            .active
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            listen_addr: args.listen_addr,
            role: args.role.parse()?,
            policy: args.policy.parse()?,
            metadata,
            active,
            shutdown_grace: Duration::from_secs(args.shutdown_grace_secs),
        })
    }
}

/// The agent a server binds, plus the registry behind it for the `active` policy.
pub struct BuiltAgent {
    pub agent: Arc<dyn AgentState>,
    pub active: Option<Arc<ActiveIntercepts>>,
}

impl ServerConfig {
    pub async fn build_agent(&self) -> Result<BuiltAgent, ConfigError> {
        let role = self.role;
        let mut registry = None;
        let agent: Arc<dyn AgentState> = match &self.policy {
            PolicySpec::Always => Arc::new(FixedState::new(true, role)),
            PolicySpec::Never => Arc::new(FixedState::new(false, role)),
            PolicySpec::Headers(pairs) => Arc::new(HeaderMatcher::new(
                pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                role,
            )?),
            PolicySpec::Caller(id) => Arc::new(CallerIdMatcher::new(id.clone(), role)),
            PolicySpec::Active => {
                let intercepts = Arc::new(ActiveIntercepts::new(role));
                for id in &self.active {
                    intercepts.activate(id.clone(), Metadata::new()).await;
                }
                registry = Some(intercepts.clone());
                intercepts
            }
        };

        let agent: Arc<dyn AgentState> = if self.metadata.is_empty() {
            agent
        } else {
            Arc::new(WithMetadata::new(agent, self.metadata.clone()))
        };
        Ok(BuiltAgent {
            agent,
            active: registry,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderMap;
    use iqs_core::protocol::{HEADER_CALLER_INTERCEPT_ID, HEADER_INTERCEPT_ID};

    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["iqs-server"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("args should parse")
    }

    #[test]
    fn policy_spec_parses_every_form() {
        assert_eq!("always".parse::<PolicySpec>().unwrap(), PolicySpec::Always);
        assert_eq!("never".parse::<PolicySpec>().unwrap(), PolicySpec::Never);
        assert_eq!("active".parse::<PolicySpec>().unwrap(), PolicySpec::Active);
        assert_eq!(
            "caller:abc:123".parse::<PolicySpec>().unwrap(),
            PolicySpec::Caller("abc:123".to_string())
        );
        assert_eq!(
            "headers:a=1,b=2".parse::<PolicySpec>().unwrap(),
            PolicySpec::Headers(vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ])
        );
    }

    #[test]
    fn policy_spec_rejects_garbage() {
        assert!(matches!(
            "sometimes".parse::<PolicySpec>(),
            Err(ConfigError::UnknownPolicy(_))
        ));
        assert!(matches!(
            "headers:".parse::<PolicySpec>(),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            "caller:".parse::<PolicySpec>(),
            Err(ConfigError::UnknownPolicy(_))
        ));
    }

    #[test]
    fn config_from_args() {
        let config = ServerConfig::try_from(&args(&[
            "--listen-addr",
            "127.0.0.1:0",
            "--role",
            "client",
            "--policy",
            "caller:abc:123",
            "--metadata",
            "a=A",
            "--shutdown-grace-secs",
            "1",
        ]))
        .expect("config should build");
        assert_eq!(config.role, Role::Client);
        assert_eq!(config.policy, PolicySpec::Caller("abc:123".to_string()));
        assert_eq!(config.metadata["a"], "A");
        assert_eq!(config.shutdown_grace, Duration::from_secs(1));
    }

    #[test]
    fn config_rejects_unknown_role() {
        let result = ServerConfig::try_from(&args(&["--role", "sidecar"]));
        assert!(matches!(result, Err(ConfigError::UnknownRole(_))));
    }

    #[tokio::test]
    async fn built_agent_honours_metadata_and_role() {
        let config = ServerConfig::try_from(&args(&[
            "--role",
            "cluster",
            "--policy",
            "headers:x-telepresence-intercept-id=abc:123",
            "--metadata",
            "a=A",
        ]))
        .expect("config should build");
        let built = config.build_agent().await.expect("agent should build");
        assert!(built.active.is_none());

        let mut headers = HeaderMap::new();
        headers.insert(HEADER_INTERCEPT_ID, "abc:123".parse().unwrap());
        let info = built.agent.intercept_info("", "/", &headers).await.unwrap();
        assert!(info.intercepted);
        assert!(!info.client_side);
        assert_eq!(info.metadata.expect("metadata")["a"], "A");
    }

    #[tokio::test]
    async fn active_policy_is_seeded_from_args() {
        let config = ServerConfig::try_from(&args(&["--policy", "active", "--active", "one, two"]))
            .expect("config should build");
        let built = config.build_agent().await.expect("agent should build");
        let registry = built.active.expect("active registry");
        assert!(registry.is_active("one").await);
        assert!(registry.is_active("two").await);

        let mut headers = HeaderMap::new();
        headers.insert(HEADER_CALLER_INTERCEPT_ID, "one".parse().unwrap());
        let info = built.agent.intercept_info("one", "/", &headers).await.unwrap();
        assert!(!info.intercepted, "only the intercept-id header selects");
    }
}
