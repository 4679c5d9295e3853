//! NX-API session for Cisco NX-OS devices
//!
//! NX-API accepts JSON `ins_api` requests on `/ins` over HTTP or HTTPS. Show
//! commands use the `cli_show_ascii` message type so the device returns the
//! same text an operator would see; configuration uses `cli_conf`, with the
//! whole batch joined by ` ; ` so it is applied in a single request.

use super::credentials::Credentials;
use crate::modules::{ModuleError, ModuleResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Default NX-API HTTPS port
pub const NXAPI_DEFAULT_HTTPS_PORT: u16 = 443;

/// Default NX-API HTTP port
pub const NXAPI_DEFAULT_HTTP_PORT: u16 = 80;

/// Default timeout for NX-API requests (seconds)
pub const NXAPI_DEFAULT_TIMEOUT: u64 = 30;

/// Separator NX-API uses between commands of one request
pub const COMMAND_SEPARATOR: &str = " ; ";

/// Protocol used to reach NX-API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for Protocol {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            _ => Err(ModuleError::InvalidParameter(format!(
                "Invalid protocol '{}'. Valid options: http, https",
                s
            ))),
        }
    }
}

/// Transport settings shared by every NX-API session
#[derive(Debug, Clone)]
pub struct NxApiOptions {
    pub timeout: Duration,
    pub validate_certs: bool,
}

impl Default for NxApiOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(NXAPI_DEFAULT_TIMEOUT),
            validate_certs: true,
        }
    }
}

/// Everything needed to open a session to one device
#[derive(Debug, Clone)]
pub struct DeviceTarget {
    /// Host name as supplied by the caller
    pub host: String,
    /// Resolved address
    pub address: IpAddr,
    pub port: u16,
    pub protocol: Protocol,
    pub credentials: Credentials,
}

impl DeviceTarget {
    /// `<scheme>://<host>:<port>/ins`. Literal addresses are written in their
    /// socket form, so IPv6 is bracketed.
    pub fn endpoint(&self) -> ModuleResult<Url> {
        let raw = match self.pinned_name() {
            Some(name) => format!("{}://{}:{}/ins", self.protocol.scheme(), name, self.port),
            None => format!(
                "{}://{}/ins",
                self.protocol.scheme(),
                SocketAddr::new(self.address, self.port)
            ),
        };
        Url::parse(&raw)
            .map_err(|e| ModuleError::InvalidParameter(format!("Invalid endpoint '{}': {}", raw, e)))
    }

    /// Host name that must be pinned to `address`, `None` for literal addresses
    fn pinned_name(&self) -> Option<&str> {
        if self.host.parse::<IpAddr>().is_ok() {
            None
        } else {
            Some(self.host.as_str())
        }
    }
}

/// Resolve `host` to the first address the system resolver returns
pub async fn resolve_host(host: &str, port: u16) -> ModuleResult<IpAddr> {
    let resolution_error = |message: String| ModuleError::HostResolution {
        host: host.to_string(),
        message,
    };

    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| resolution_error(e.to_string()))?;

    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| resolution_error("no addresses returned".to_string()))
}

/// Operations the reconciler needs from a device session
#[async_trait]
pub trait NxosDevice: Send + Sync {
    /// Run a show command and return its text output
    async fn show_text(&self, command: &str) -> ModuleResult<String>;

    /// Apply configuration lines as one batch
    async fn configure(&self, commands: &[String]) -> ModuleResult<()>;
}

/// Opens device sessions
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    async fn connect(&self, target: &DeviceTarget) -> ModuleResult<Arc<dyn NxosDevice>>;
}

// ============================================================================
// NX-API wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct NxApiRequest<'a> {
    ins_api: NxApiInsApi<'a>,
}

#[derive(Debug, Serialize)]
struct NxApiInsApi<'a> {
    version: &'a str,
    #[serde(rename = "type")]
    req_type: &'a str,
    chunk: &'a str,
    sid: &'a str,
    input: &'a str,
    output_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct NxApiResponse {
    ins_api: NxApiInsApiResponse,
}

#[derive(Debug, Deserialize)]
struct NxApiInsApiResponse {
    outputs: NxApiOutputs,
}

#[derive(Debug, Deserialize)]
struct NxApiOutputs {
    output: NxApiOutputWrapper,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NxApiOutputWrapper {
    Single(NxApiOutput),
    Multiple(Vec<NxApiOutput>),
}

impl NxApiOutputWrapper {
    fn into_vec(self) -> Vec<NxApiOutput> {
        match self {
            NxApiOutputWrapper::Single(out) => vec![out],
            NxApiOutputWrapper::Multiple(outs) => outs,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NxApiOutput {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    clierror: Option<String>,
    #[serde(default)]
    body: serde_json::Value,
}

impl NxApiOutput {
    fn is_success(&self) -> bool {
        self.code == "200"
    }

    /// Error text as the device reported it
    fn error_text(&self) -> String {
        match self.clierror.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => self.msg.clone(),
        }
    }
}

// ============================================================================
// NX-API client
// ============================================================================

/// HTTP session to one NX-API endpoint
pub struct NxApiClient {
    client: Client,
    endpoint: Url,
    credentials: Credentials,
}

impl fmt::Debug for NxApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NxApiClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl NxApiClient {
    pub fn new(endpoint: Url, credentials: Credentials, options: &NxApiOptions) -> ModuleResult<Self> {
        Self::build(endpoint, credentials, options, None)
    }

    /// Session for `target`. The host name stays in the URL (TLS checks the
    /// certificate against it) while connections go to the resolved address.
    pub fn for_target(target: &DeviceTarget, options: &NxApiOptions) -> ModuleResult<Self> {
        let pinned = target
            .pinned_name()
            .map(|name| (name, SocketAddr::new(target.address, target.port)));
        Self::build(target.endpoint()?, target.credentials.clone(), options, pinned)
    }

    fn build(
        endpoint: Url,
        credentials: Credentials,
        options: &NxApiOptions,
        pinned: Option<(&str, SocketAddr)>,
    ) -> ModuleResult<Self> {
        let mut builder = Client::builder().timeout(options.timeout);
        if endpoint.scheme() == "https" && !options.validate_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some((name, address)) = pinned {
            builder = builder.resolve(name, address);
        }

        let client = builder.build().map_err(|e| {
            ModuleError::Connection(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            endpoint,
            credentials,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send(&self, req_type: &str, input: &str) -> ModuleResult<Vec<NxApiOutput>> {
        let request = NxApiRequest {
            ins_api: NxApiInsApi {
                version: "1.0",
                req_type,
                chunk: "0",
                sid: "1",
                input,
                output_format: "json",
            },
        };

        trace!(endpoint = %self.endpoint, req_type, input, "Sending NX-API request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| ModuleError::Connection(format!("NX-API request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ModuleError::Connection(format!("Failed to read NX-API response: {}", e))
        })?;

        // CLI errors can arrive with a 4xx/5xx status but a well-formed ins_api body
        match serde_json::from_str::<NxApiResponse>(&body) {
            Ok(api_response) => Ok(api_response.ins_api.outputs.output.into_vec()),
            Err(_) if !status.is_success() => Err(ModuleError::Connection(format!(
                "NX-API returned error status {}: {}",
                status, body
            ))),
            Err(e) => Err(ModuleError::Connection(format!(
                "Failed to parse NX-API response: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl NxosDevice for NxApiClient {
    async fn show_text(&self, command: &str) -> ModuleResult<String> {
        let outputs = self.send("cli_show_ascii", command).await?;

        let output = outputs
            .into_iter()
            .next()
            .ok_or_else(|| ModuleError::Connection("Empty NX-API response".to_string()))?;

        if !output.is_success() {
            return Err(ModuleError::ExecutionFailed(format!(
                "'{}' failed: {}",
                command,
                output.error_text()
            )));
        }

        match output.body {
            serde_json::Value::String(text) => Ok(text),
            serde_json::Value::Null => Ok(String::new()),
            other => Ok(other.to_string()),
        }
    }

    async fn configure(&self, commands: &[String]) -> ModuleResult<()> {
        let batch = commands.join(COMMAND_SEPARATOR);
        let outputs = self.send("cli_conf", &batch).await?;

        if let Some(failed) = outputs.iter().find(|output| !output.is_success()) {
            return Err(ModuleError::DeviceConfig(failed.error_text()));
        }

        debug!(count = commands.len(), "NX-API accepted configuration batch");
        Ok(())
    }
}

/// Opens [`NxApiClient`] sessions
#[derive(Debug, Clone, Default)]
pub struct NxApiConnector {
    options: NxApiOptions,
}

impl NxApiConnector {
    pub fn new(options: NxApiOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NxApiOptions {
        &self.options
    }
}

#[async_trait]
impl DeviceConnector for NxApiConnector {
    async fn connect(&self, target: &DeviceTarget) -> ModuleResult<Arc<dyn NxosDevice>> {
        let client = NxApiClient::for_target(target, &self.options)?;
        debug!(host = %target.host, endpoint = %client.endpoint(), "Opened NX-API session");
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    fn target(host: &str, address: IpAddr, port: u16, protocol: Protocol) -> DeviceTarget {
        DeviceTarget {
            host: host.to_string(),
            address,
            port,
            protocol,
            credentials: Credentials::new("admin", "admin"),
        }
    }

    #[test]
    fn test_protocol_from_str() {
        assert_eq!("http".parse::<Protocol>().unwrap(), Protocol::Http);
        assert_eq!("https".parse::<Protocol>().unwrap(), Protocol::Https);
        assert!("ssh".parse::<Protocol>().is_err());
        assert!("HTTP".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_default_options() {
        let options = NxApiOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert!(options.validate_certs);
    }

    #[test]
    fn test_endpoint_ipv4() {
        let address: IpAddr = "192.168.1.1".parse().unwrap();
        let t = target("192.168.1.1", address, 80, Protocol::Http);
        assert_eq!(t.endpoint().unwrap().as_str(), "http://192.168.1.1/ins");
        assert_eq!(t.pinned_name(), None);

        let t = target("192.168.1.1", address, 8443, Protocol::Https);
        assert_eq!(t.endpoint().unwrap().as_str(), "https://192.168.1.1:8443/ins");
    }

    #[test]
    fn test_endpoint_ipv6_is_bracketed() {
        let t = target("::1", IpAddr::V6(Ipv6Addr::LOCALHOST), 8080, Protocol::Http);
        assert_eq!(t.endpoint().unwrap().as_str(), "http://[::1]:8080/ins");
        assert_eq!(t.pinned_name(), None);
    }

    #[test]
    fn test_endpoint_keeps_host_name() {
        let address: IpAddr = "10.0.0.1".parse().unwrap();
        let t = target("nexus-01.example.net", address, 443, Protocol::Https);
        assert_eq!(t.endpoint().unwrap().as_str(), "https://nexus-01.example.net/ins");
        assert_eq!(t.pinned_name(), Some("nexus-01.example.net"));

        let t = target("nexus-01.example.net", address, 8080, Protocol::Http);
        assert_eq!(t.endpoint().unwrap().as_str(), "http://nexus-01.example.net:8080/ins");
    }

    #[test]
    fn test_client_for_named_target() {
        let t = target("nexus-01.example.net", "10.0.0.1".parse().unwrap(), 443, Protocol::Https);
        let client = NxApiClient::for_target(&t, &NxApiOptions::default()).unwrap();
        assert_eq!(client.endpoint().host_str(), Some("nexus-01.example.net"));
    }

    #[test]
    fn test_output_error_text_prefers_clierror() {
        let output: NxApiOutput = serde_json::from_value(serde_json::json!({
            "code": "400",
            "msg": "CLI execution error",
            "clierror": "% Invalid command at '^' marker.\n",
            "input": "ip igmp bogus"
        }))
        .unwrap();
        assert!(!output.is_success());
        assert_eq!(output.error_text(), "% Invalid command at '^' marker.");

        let output: NxApiOutput = serde_json::from_value(serde_json::json!({
            "code": "413",
            "msg": "Request too large"
        }))
        .unwrap();
        assert_eq!(output.error_text(), "Request too large");
    }

    #[test]
    fn test_output_wrapper_accepts_single_and_list() {
        let single: NxApiOutputs = serde_json::from_value(serde_json::json!({
            "output": {"code": "200", "msg": "Success", "body": {}}
        }))
        .unwrap();
        assert_eq!(single.output.into_vec().len(), 1);

        let multiple: NxApiOutputs = serde_json::from_value(serde_json::json!({
            "output": [
                {"code": "200", "msg": "Success", "body": {}},
                {"code": "200", "msg": "Success", "body": {}}
            ]
        }))
        .unwrap();
        assert_eq!(multiple.output.into_vec().len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_literal_address() {
        let addr = resolve_host("127.0.0.1", 80).await.unwrap();
        assert_eq!(addr, IpAddr::from([127, 0, 0, 1]));
    }

    #[tokio::test]
    async fn test_resolve_invalid_host() {
        let err = resolve_host("no such host.invalid", 80).await.unwrap_err();
        assert!(matches!(err, ModuleError::HostResolution { .. }));
    }
}
