//! Account and engine configuration
//!
//! [`CallConfig`] is what the application supplies. [`EngineSettings`] and
//! [`AccountParams`] are derived from it and handed to the signalling engine.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SoftphoneError, SoftphoneResult};

/// Default interval of the reachability monitor
pub const DEFAULT_REACHABILITY_INTERVAL: Duration = Duration::from_secs(5);

/// SIP transport used to reach the proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Udp,
    Tcp,
    Tls,
    #[default]
    Wss,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Udp => "udp",
            Transport::Tcp => "tcp",
            Transport::Tls => "tls",
            Transport::Wss => "wss",
        }
    }
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = SoftphoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "udp" => Ok(Transport::Udp),
            "tcp" => Ok(Transport::Tcp),
            "tls" => Ok(Transport::Tls),
            "wss" => Ok(Transport::Wss),
            other => Err(SoftphoneError::core_setup_failed(format!(
                "unsupported transport '{other}'"
            ))),
        }
    }
}

/// SIP account configuration supplied by the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallConfig {
    /// Extension (user part of the identity)
    pub ext: String,
    /// Account password
    pub password: String,
    /// SIP domain
    pub domain: String,
    /// Proxy host
    pub sip_proxy: String,
    /// Proxy port
    pub port: u16,
    /// Proxy transport
    #[serde(default)]
    pub transport: Transport,
    /// Caller number attached to outgoing calls as `X-DID`
    #[serde(default)]
    pub did_number: Option<String>,
    /// Probe interval of the reachability monitor; `None` disables it
    #[serde(default, with = "interval_secs")]
    pub reachability_interval: Option<Duration>,
}

impl CallConfig {
    /// Create a configuration with the default transport and no DID
    pub fn new(
        ext: impl Into<String>,
        password: impl Into<String>,
        domain: impl Into<String>,
        sip_proxy: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            ext: ext.into(),
            password: password.into(),
            domain: domain.into(),
            sip_proxy: sip_proxy.into(),
            port,
            transport: Transport::default(),
            did_number: None,
            reachability_interval: None,
        }
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_did_number(mut self, did: impl Into<String>) -> Self {
        self.did_number = Some(did.into());
        self
    }

    pub fn with_reachability_interval(mut self, interval: Duration) -> Self {
        self.reachability_interval = Some(interval);
        self
    }

    /// Enable the reachability monitor with the default period
    pub fn with_reachability_monitor(self) -> Self {
        self.with_reachability_interval(DEFAULT_REACHABILITY_INTERVAL)
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> SoftphoneResult<Self> {
        let config: CallConfig = toml::from_str(text)
            .map_err(|e| SoftphoneError::core_setup_failed(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every mandatory field is present
    pub fn validate(&self) -> SoftphoneResult<()> {
        let required = [
            ("ext", &self.ext),
            ("password", &self.password),
            ("domain", &self.domain),
            ("sip_proxy", &self.sip_proxy),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(SoftphoneError::core_setup_failed(format!("{name} must not be empty")));
            }
        }
        if self.port == 0 {
            return Err(SoftphoneError::core_setup_failed("port must not be 0"));
        }
        if let Some(interval) = self.reachability_interval {
            if interval.is_zero() {
                return Err(SoftphoneError::core_setup_failed(
                    "reachability interval must not be 0",
                ));
            }
        }
        Ok(())
    }

    /// Account identity, `sip:<ext>@<domain>`
    pub fn identity_uri(&self) -> String {
        format!("sip:{}@{}", self.ext, self.domain)
    }

    /// Proxy address, `sip:<proxy>:<port>;transport=<transport>`
    pub fn proxy_uri(&self) -> String {
        format!("sip:{}:{};transport={}", self.sip_proxy, self.port, self.transport)
    }

    /// `host:port` of the proxy, used by the reachability probe
    pub fn proxy_socket_addr(&self) -> String {
        format!("{}:{}", self.sip_proxy, self.port)
    }
}

mod interval_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_secs))
    }
}

/// Audio codec enabled on the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecPreference {
    /// Codec name as the engine knows it
    pub name: String,
    /// Fixed bitrate in bits per second, if any
    pub bitrate_bps: Option<u32>,
}

impl CodecPreference {
    fn new(name: &str, bitrate_bps: Option<u32>) -> Self {
        Self { name: name.to_string(), bitrate_bps }
    }
}

/// Settings applied when the engine starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    pub user_agent: String,
    pub user_agent_version: String,
    /// Enabled codecs in priority order; all others are disabled
    pub codecs: Vec<CodecPreference>,
    pub echo_cancellation: bool,
    pub adaptive_rate_control: bool,
    pub keep_alive: bool,
    pub video_enabled: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            user_agent: "MakeCallSDK".to_string(),
            user_agent_version: crate::VERSION.to_string(),
            codecs: vec![
                CodecPreference::new("opus", Some(64_000)),
                CodecPreference::new("pcmu", None),
                CodecPreference::new("pcma", None),
                CodecPreference::new("g722", None),
            ],
            echo_cancellation: true,
            adaptive_rate_control: true,
            keep_alive: true,
            video_enabled: false,
        }
    }
}

/// Registration parameters of the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountParams {
    pub identity: String,
    pub username: String,
    pub password: String,
    pub domain: String,
    pub proxy: String,
    pub outbound_proxy: bool,
    pub register_enabled: bool,
    pub expires_secs: u32,
}

impl AccountParams {
    pub fn from_config(config: &CallConfig) -> Self {
        Self {
            identity: config.identity_uri(),
            username: config.ext.clone(),
            password: config.password.clone(),
            domain: config.domain.clone(),
            proxy: config.proxy_uri(),
            outbound_proxy: true,
            register_enabled: true,
            expires_secs: 3600,
        }
    }
}
