// Vehicle API client - request/refresh/retry protocol and linking calls
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::application::vehicle_gateway::VehicleGateway;
use crate::domain::credentials::CredentialPair;
use crate::domain::snapshot::TelemetrySnapshot;
use crate::domain::vehicle::{Organization, VehicleRecord};
use crate::error::VehicleApiError;

const SIGN_UP_PATH: &str = "/id-service/auth/sign-up";
const SIGN_IN_PATH: &str = "/id-service/auth/sign-in";
const ORG_LIST_PATH: &str = "/id-service/org/my";
const ORG_SIGN_IN_PATH: &str = "/id-service/org/sign-in";
const REFRESH_TOKEN_PATH: &str = "/id-service/auth/refresh-token";
const CAR_SEARCH_PATH: &str = "/car-service/car/v2/search";

/// Platform identifier the API expects on every request.
const APP_PLATFORM: &str = "web";

/// One request against the remote API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: &'static str,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: &'static str) -> Self {
        Self {
            method: Method::GET,
            path,
            bearer: None,
            body: None,
        }
    }

    pub fn post(path: &'static str) -> Self {
        Self {
            method: Method::POST,
            path,
            bearer: None,
            body: None,
        }
    }

    pub fn with_bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status plus parsed JSON body; an empty or non-JSON body reads as `Null`.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// User-facing diagnostic from the JSON `message` field, if present.
    fn message(&self) -> String {
        self.body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no error message")
            .to_string()
    }
}

/// Narrow seam over the HTTP round-trip so the bounded retry/refresh
/// protocol is testable without a network. Only transport-level failures
/// surface as errors; any parsed status is a normal response.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, VehicleApiError>;
}

/// Production transport over `reqwest`. The request timeout is configured
/// on the underlying client by the caller.
pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, VehicleApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(request.method, &url)
            .header("x-app", APP_PLATFORM);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        Ok(ApiResponse { status, body })
    }
}

/// Client for the telemetry hot path of a single authenticated
/// account/vehicle pair. Owns the live credential pair for the duration of
/// a cycle and rotates it in place when the access token expires.
pub struct VehicleApiClient {
    transport: Arc<dyn ApiTransport>,
    car_id: String,
    credentials: CredentialPair,
}

impl VehicleApiClient {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        car_id: impl Into<String>,
        credentials: CredentialPair,
    ) -> Self {
        Self {
            transport,
            car_id: car_id.into(),
            credentials,
        }
    }

    fn authed(&self, method: Method, path: &'static str, body: Option<Value>) -> ApiRequest {
        ApiRequest {
            method,
            path,
            bearer: Some(self.credentials.access_token.clone()),
            body,
        }
    }

    /// Issue an authenticated request, refreshing the token pair and
    /// retrying exactly once on 401. A second 401 means the refreshed
    /// token was rejected too; no further attempt is made.
    async fn request_with_refresh(
        &mut self,
        method: Method,
        path: &'static str,
        body: Option<Value>,
    ) -> Result<ApiResponse, VehicleApiError> {
        let response = self
            .transport
            .execute(self.authed(method.clone(), path, body.clone()))
            .await?;

        if response.status == 401 {
            if !self.refresh_credentials().await {
                return Err(VehicleApiError::AuthFailed(
                    "access token expired and refresh was rejected".into(),
                ));
            }

            let retry = self.transport.execute(self.authed(method, path, body)).await?;
            if retry.status == 401 {
                return Err(VehicleApiError::AuthFailed(
                    "refreshed access token was rejected".into(),
                ));
            }
            if retry.status != 200 {
                return Err(VehicleApiError::Api {
                    status: retry.status,
                    message: retry.message(),
                });
            }
            return Ok(retry);
        }

        if response.status != 200 {
            return Err(VehicleApiError::Api {
                status: response.status,
                message: response.message(),
            });
        }
        Ok(response)
    }

    /// Exchange the refresh token for a new pair. Any failure leaves the
    /// current pair untouched.
    async fn refresh_credentials(&mut self) -> bool {
        let request = ApiRequest::post(REFRESH_TOKEN_PATH)
            .with_body(json!({ "refreshToken": self.credentials.refresh_token }));

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("token refresh request failed: {err}");
                return false;
            }
        };
        if response.status != 200 {
            tracing::warn!(status = response.status, "token refresh failed");
            return false;
        }

        let access = response.body.get("accessToken").and_then(Value::as_str);
        let refresh = response.body.get("refreshToken").and_then(Value::as_str);
        match (access, refresh) {
            (Some(access), Some(refresh)) => {
                self.credentials.replace(access, refresh);
                tracing::debug!("access token refreshed");
                true
            }
            _ => {
                tracing::warn!("token refresh response missing tokens");
                false
            }
        }
    }
}

#[async_trait]
impl VehicleGateway for VehicleApiClient {
    async fn fetch_snapshot(&mut self) -> Result<TelemetrySnapshot, VehicleApiError> {
        let body = json!({
            "addSensors": true,
            "filters": { "_id": self.car_id }
        });
        let response = self
            .request_with_refresh(Method::POST, CAR_SEARCH_PATH, Some(body))
            .await?;

        let raw = response
            .body
            .get("rows")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .ok_or_else(|| VehicleApiError::NotFound(self.car_id.clone()))?;

        Ok(TelemetrySnapshot::from_raw(raw))
    }

    fn credentials(&self) -> CredentialPair {
        self.credentials.clone()
    }
}

// ── Linking calls (used once during account setup, not while polling) ──

/// Request an SMS verification code for a phone number. The endpoint
/// reports spurious 4xx even when the SMS goes out, so only server errors
/// are treated as failures.
pub async fn request_sms(
    transport: &dyn ApiTransport,
    phone: &str,
) -> Result<(), VehicleApiError> {
    let request = ApiRequest::post(SIGN_UP_PATH)
        .with_body(json!({ "phone": phone, "capchaToken": "" }));
    let response = transport.execute(request).await?;
    if response.status >= 500 {
        return Err(VehicleApiError::Connection(format!(
            "server error: {}",
            response.status
        )));
    }
    Ok(())
}

/// Verify the SMS code and obtain the initial token pair. 403 means the
/// code was wrong.
pub async fn sign_in(
    transport: &dyn ApiTransport,
    phone: &str,
    code: &str,
) -> Result<CredentialPair, VehicleApiError> {
    let request =
        ApiRequest::post(SIGN_IN_PATH).with_body(json!({ "phone": phone, "code": code }));
    let response = transport.execute(request).await?;

    if response.status == 403 {
        return Err(VehicleApiError::AuthFailed(response.message()));
    }
    if response.status != 200 {
        return Err(VehicleApiError::Api {
            status: response.status,
            message: response.message(),
        });
    }

    credential_pair_from(&response.body)
        .ok_or_else(|| VehicleApiError::AuthFailed("sign-in response missing tokens".into()))
}

/// List the organizations the account belongs to; failures read as none.
pub async fn organizations(
    transport: &dyn ApiTransport,
    access_token: &str,
) -> Result<Vec<Organization>, VehicleApiError> {
    let request = ApiRequest::get(ORG_LIST_PATH).with_bearer(access_token);
    let response = transport.execute(request).await?;
    if response.status != 200 {
        return Ok(Vec::new());
    }
    Ok(list_payload(&response.body)
        .iter()
        .filter_map(Organization::from_raw)
        .collect())
}

/// Select an organization. Returns the rotated pair when the API issues
/// org-scoped tokens, `None` when it keeps the account-scoped ones.
pub async fn sign_in_org(
    transport: &dyn ApiTransport,
    access_token: &str,
    org_id: &str,
) -> Result<Option<CredentialPair>, VehicleApiError> {
    let request = ApiRequest::post(ORG_SIGN_IN_PATH)
        .with_bearer(access_token)
        .with_body(json!({ "orgId": org_id }));
    let response = transport.execute(request).await?;
    if response.status != 200 {
        return Err(VehicleApiError::Api {
            status: response.status,
            message: response.message(),
        });
    }
    Ok(credential_pair_from(&response.body))
}

/// List the vehicles visible to the account; failures read as none.
pub async fn search_vehicles(
    transport: &dyn ApiTransport,
    access_token: &str,
) -> Result<Vec<VehicleRecord>, VehicleApiError> {
    let request = ApiRequest::post(CAR_SEARCH_PATH)
        .with_bearer(access_token)
        .with_body(json!({ "addSensors": false }));
    let response = transport.execute(request).await?;
    if response.status != 200 {
        return Ok(Vec::new());
    }
    Ok(list_payload(&response.body)
        .iter()
        .filter_map(VehicleRecord::from_raw)
        .collect())
}

fn credential_pair_from(body: &Value) -> Option<CredentialPair> {
    let access = body.get("accessToken").and_then(Value::as_str)?;
    let refresh = body.get("refreshToken").and_then(Value::as_str)?;
    Some(CredentialPair::new(access, refresh))
}

/// The list endpoints return either a bare array or an object wrapping it
/// in `rows` or `items`.
fn list_payload(body: &Value) -> Vec<Value> {
    if let Some(items) = body.as_array() {
        return items.clone();
    }
    ["rows", "items"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_array).cloned())
        .unwrap_or_default()
}
