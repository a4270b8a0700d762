//! WorkSpaces API client.
//!
//! The service speaks the AWS JSON 1.1 protocol: every operation is a `POST`
//! to the regional endpoint with the operation named in `X-Amz-Target` and a
//! JSON body. Requests are signed with SigV4.

use std::error::Error as StdError;
use std::future::Future;
use std::time::{Duration, SystemTime};

use aws_config::BehaviorVersion;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sigv4::http_request::{
    sign, SignableBody, SignableRequest, SigningParams, SigningSettings,
};
use aws_sigv4::sign::v4;
use serde_json::{Map, Value};
use tracing::{debug, trace};
use url::Url;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{CliError, RemoteError};

/// SigV4 signing name.
pub const SERVICE_NAME: &str = "workspaces";

/// `X-Amz-Target` prefix.
pub const TARGET_PREFIX: &str = "WorkspacesService";

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// A remote endpoint that executes WorkSpaces operations.
///
/// The invoker only sees this trait, so tests substitute scripted clients.
pub trait WorkspacesApi: Send + Sync {
    /// Execute `operation` with a JSON request body and return the JSON
    /// response body.
    fn call(
        &self,
        operation: &'static str,
        request: Value,
    ) -> impl Future<Output = Result<Value, RemoteError>> + Send;
}

/// Signed HTTP client for the WorkSpaces JSON API.
#[derive(Debug)]
pub struct HttpWorkspacesClient {
    http: reqwest::Client,
    endpoint: Url,
    region: String,
    credentials: SharedCredentialsProvider,
    request_timeout: Duration,
}

impl HttpWorkspacesClient {
    /// Resolve region and credentials through the AWS default chain, with
    /// `settings` taking precedence.
    pub async fn from_settings(settings: &Settings) -> Result<Self, CliError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &settings.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &settings.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        let sdk = loader.load().await;

        let region = sdk.region().map(ToString::to_string).ok_or_else(|| {
            CliError::Config(
                "no region configured: pass --region, set AWS_REGION or add region to the config file"
                    .into(),
            )
        })?;
        let credentials = sdk
            .credentials_provider()
            .ok_or_else(|| CliError::Config("no credentials provider available".into()))?;

        let endpoint = match &settings.endpoint_url {
            Some(endpoint) => Url::parse(endpoint)
                .map_err(|e| CliError::Config(format!("invalid endpoint_url: {e}")))?,
            None => default_endpoint(&region)?,
        };

        let http = reqwest::Client::builder()
            .user_agent(concat!("wsctl/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| CliError::Config(format!("failed to build HTTP client: {e}")))?;

        debug!(%endpoint, %region, "workspaces client ready");
        Ok(Self {
            http,
            endpoint,
            region,
            credentials,
            request_timeout: settings.request_timeout,
        })
    }

    /// Endpoint requests are sent to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Region requests are signed for.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    fn classify(&self, err: &reqwest::Error) -> RemoteError {
        if err.is_timeout() {
            return RemoteError::Timeout(self.request_timeout);
        }
        if is_name_resolution(err) {
            return RemoteError::NameResolution {
                region: self.region.clone(),
                endpoint: self
                    .endpoint
                    .host_str()
                    .unwrap_or(self.endpoint.as_str())
                    .to_string(),
            };
        }
        RemoteError::Transport(error_chain(err))
    }
}

impl WorkspacesApi for HttpWorkspacesClient {
    async fn call(&self, operation: &'static str, request: Value) -> Result<Value, RemoteError> {
        let body = serde_json::to_vec(&request).map_err(|e| RemoteError::Encode(e.to_string()))?;
        let target = format!("{TARGET_PREFIX}.{operation}");
        let invocation_id = Uuid::new_v4().to_string();

        let credentials = self
            .credentials
            .provide_credentials()
            .await
            .map_err(|e| RemoteError::Credentials(error_chain(&e)))?;
        let identity = credentials.into();
        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(SERVICE_NAME)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| RemoteError::Signing(e.to_string()))?
            .into();

        let headers = [
            ("content-type", CONTENT_TYPE),
            ("x-amz-target", target.as_str()),
            ("amz-sdk-invocation-id", invocation_id.as_str()),
        ];
        let signable = SignableRequest::new(
            "POST",
            self.endpoint.as_str(),
            headers.iter().copied(),
            SignableBody::Bytes(&body),
        )
        .map_err(|e| RemoteError::Signing(e.to_string()))?;
        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| RemoteError::Signing(e.to_string()))?
            .into_parts();

        let mut builder = self.http.post(self.endpoint.clone());
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        for (name, value) in instructions.headers() {
            builder = builder.header(name, value);
        }

        trace!(%target, %invocation_id, bytes = body.len(), "sending request");
        let response = builder
            .body(body)
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status();
        let error_type = header_string(response.headers(), "x-amzn-errortype");
        let request_id = header_string(response.headers(), "x-amzn-requestid");
        let bytes = response.bytes().await.map_err(|e| self.classify(&e))?;
        debug!(%target, status = status.as_u16(), request_id = ?request_id, "response received");

        if status.is_success() {
            decode_success(&bytes)
        } else {
            Err(decode_service_error(
                status.as_u16(),
                error_type.as_deref(),
                request_id,
                &bytes,
            ))
        }
    }
}

/// `https://workspaces.<region>.amazonaws.com/`.
fn default_endpoint(region: &str) -> Result<Url, CliError> {
    let suffix = if region.starts_with("cn-") {
        "amazonaws.com.cn"
    } else {
        "amazonaws.com"
    };
    Url::parse(&format!("https://{SERVICE_NAME}.{region}.{suffix}/"))
        .map_err(|e| CliError::Config(format!("invalid region '{region}': {e}")))
}

fn header_string(headers: &reqwest::header::HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

/// Whether any error in the source chain is a failed DNS lookup.
pub fn is_name_resolution(err: &(dyn StdError + 'static)) -> bool {
    const MARKERS: &[&str] = &[
        "dns error",
        "failed to lookup address",
        "name or service not known",
        "nodename nor servname",
        "no such host is known",
        "temporary failure in name resolution",
    ];
    std::iter::successors(Some(err), |&e| e.source()).any(|e| {
        let text = e.to_string().to_ascii_lowercase();
        MARKERS.iter().any(|marker| text.contains(marker))
    })
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        text.push_str(": ");
        text.push_str(&e.to_string());
        source = e.source();
    }
    text
}

/// Decode a 2xx body. Operations with no output return an empty body.
pub fn decode_success(body: &[u8]) -> Result<Value, RemoteError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    match serde_json::from_slice(body) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(RemoteError::Decode(format!(
            "expected a JSON object, got {}",
            json_type(&other)
        ))),
        Err(e) => Err(RemoteError::Decode(e.to_string())),
    }
}

/// Decode a non-2xx response into a service error.
///
/// The code comes from the body's `__type` (namespace and `:` suffix
/// stripped) or the `x-amzn-errortype` header.
#[must_use]
pub fn decode_service_error(
    status: u16,
    error_type: Option<&str>,
    request_id: Option<String>,
    body: &[u8],
) -> RemoteError {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(Value::as_str)
            .map(ToString::to_string)
    };

    let code = field("__type")
        .as_deref()
        .or(error_type)
        .map(sanitize_error_code)
        .filter(|code| !code.is_empty())
        .unwrap_or_else(|| format!("Http{status}"));
    let message = field("message")
        .or_else(|| field("Message"))
        .unwrap_or_else(|| format!("service returned HTTP {status}"));

    RemoteError::Service {
        code,
        message,
        status,
        request_id,
    }
}

fn sanitize_error_code(raw: &str) -> String {
    let code = raw.split(':').next().unwrap_or(raw);
    let code = code.rsplit('#').next().unwrap_or(code);
    code.trim().to_string()
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
