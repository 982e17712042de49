//! HTTP client for the service desk account API.
//!
//! Implements the engine's remote traits against `/api/v1/accounts` and
//! `/api/v1/contacts`. Every response uses the
//! `{ success, data, error: { code, message } }` envelope. Mutating
//! endpoints only acknowledge the change, so the client reads the record
//! back afterwards.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use accountdesk_core::accounts::{
    Account, AccountFilter, AccountRemoteTrait, AccountType, AccountUpdate, DependentCounts,
    NewAccount,
};
use accountdesk_core::contacts::{
    Contact, ContactRemoteTrait, ContactStatus, ContactUpdate, NewContact,
};
use accountdesk_core::dealers::{
    DeactivationOutcome, DealerDeactivationCommand, TransferRecord, TransferTarget,
};
use accountdesk_core::errors::{Error, Result, ValidationError};
use accountdesk_core::utils::serde_utils::flexible_bool_opt;

use crate::config::ConnectConfig;

/// Page size used when listing accounts without a search term.
const LIST_PAGE_SIZE: u32 = 100;

// ─────────────────────────────────────────────────────────────────────────────
// API Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    /// Present on paginated listings.
    #[serde(default)]
    meta: Option<ApiPageMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPageMeta {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total: u32,
    #[serde(default)]
    total_pages: u32,
}

impl ApiPageMeta {
    fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiFailure {
    #[serde(default)]
    error: Option<ApiErrorBody>,
    #[serde(default)]
    counts: Option<DependentCounts>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Account row; the backend flags soft deletion with `is_deleted`.
#[derive(Debug, Deserialize)]
struct ApiAccount {
    #[serde(flatten)]
    account: Account,
    #[serde(default, deserialize_with = "flexible_bool_opt")]
    is_deleted: Option<bool>,
}

impl From<ApiAccount> for Account {
    fn from(api: ApiAccount) -> Self {
        let mut account = api.account;
        match api.is_deleted {
            Some(false) => account.deleted_at = None,
            Some(true) if account.deleted_at.is_none() => {
                account.deleted_at = Some(account.updated_at)
            }
            _ => {}
        }
        account
    }
}

#[derive(Debug, Default, Deserialize)]
struct ApiStatistics {
    #[serde(default)]
    inquiry_count: u32,
    #[serde(default)]
    rma_count: u32,
    #[serde(default)]
    repair_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiAccountDetail {
    #[serde(default)]
    statistics: Option<ApiStatistics>,
    #[serde(default)]
    devices: Vec<serde_json::Value>,
}

impl From<ApiAccountDetail> for DependentCounts {
    fn from(detail: ApiAccountDetail) -> Self {
        let stats = detail.statistics.unwrap_or_default();
        DependentCounts::new(
            stats.inquiry_count,
            stats.rma_count,
            stats.repair_count,
            detail.devices.len() as u32,
        )
    }
}

#[derive(Debug, Deserialize)]
struct ApiCreated {
    id: i64,
}

#[derive(Debug, Serialize)]
struct ApiDealerDeactivation<'a> {
    reason: &'a str,
    transfer_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    successor_account_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

impl<'a> From<&'a DealerDeactivationCommand> for ApiDealerDeactivation<'a> {
    fn from(command: &'a DealerDeactivationCommand) -> Self {
        Self {
            reason: &command.reason,
            transfer_type: transfer_type_code(&command.transfer),
            successor_account_id: command.transfer.successor_id(),
            notes: command.notes.as_deref(),
        }
    }
}

fn transfer_type_code(transfer: &TransferTarget) -> &'static str {
    match transfer {
        TransferTarget::DirectService => "dealer_to_direct",
        TransferTarget::Successor(_) => "dealer_to_dealer",
    }
}

/// Transfer row; `transfer_type` uses the backend's lowercase codes.
#[derive(Debug, Deserialize)]
struct ApiTransferRecord {
    #[serde(flatten)]
    record: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<ApiTransferRecord> for TransferRecord {
    type Error = Error;

    fn try_from(api: ApiTransferRecord) -> Result<Self> {
        let mut record = api.record;
        let code = record
            .get("transfer_type")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let transfer_type = match code.as_deref() {
            Some("dealer_to_dealer") | Some("SUCCESSOR_DEALER") => "SUCCESSOR_DEALER",
            _ => "DIRECT",
        };
        record.insert("transfer_type".to_string(), json!(transfer_type));
        Ok(serde_json::from_value(serde_json::Value::Object(record))?)
    }
}

/// Contact rows listed under an account omit `account_id`.
fn contact_with_account(
    mut row: serde_json::Map<String, serde_json::Value>,
    account_id: i64,
) -> Result<Contact> {
    row.entry("account_id").or_insert(json!(account_id));
    Ok(serde_json::from_value(serde_json::Value::Object(row))?)
}

/// Maps a failed response to the engine's error taxonomy.
pub(crate) fn map_api_error(status: StatusCode, body: &str) -> Error {
    let failure: ApiFailure = serde_json::from_str(body).unwrap_or_default();
    let error = failure.error.unwrap_or_default();
    let message = error
        .message
        .unwrap_or_else(|| body.chars().take(200).collect::<String>());

    match (error.code.as_deref(), status) {
        (Some("CANNOT_DELETE_HAS_HISTORY"), _) => Error::Ineligible {
            counts: failure.counts.unwrap_or_default(),
        },
        (Some("NOT_FOUND"), _) | (_, StatusCode::NOT_FOUND) => Error::NotFound(message),
        (Some("ALREADY_INACTIVE"), _) | (Some("ALREADY_ACTIVE"), _) | (Some("INVALID_TYPE"), _) => {
            Error::InvalidState(message)
        }
        (Some("VALIDATION_ERROR"), _) | (_, StatusCode::BAD_REQUEST) => {
            Error::Validation(ValidationError::InvalidInput(message))
        }
        (_, StatusCode::CONFLICT) => Error::Conflict(message),
        (_, StatusCode::REQUEST_TIMEOUT) | (_, StatusCode::TOO_MANY_REQUESTS) => {
            Error::Unavailable(format!("HTTP {}: {}", status, message))
        }
        (_, s) if s.is_server_error() => Error::Unavailable(format!("HTTP {}: {}", status, message)),
        _ => Error::Unexpected(format!("API error {}: {}", status, message)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Account API Client
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP client for the account API.
///
/// # Example
///
/// ```ignore
/// let config = ConnectConfig::from_env()?;
/// let client = Arc::new(AccountDeskClient::new(&config)?);
/// let contacts = ContactService::new(client.clone(), client.clone(), cache, events);
/// ```
#[derive(Debug, Clone)]
pub struct AccountDeskClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: Option<HeaderValue>,
}

impl AccountDeskClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be used as a header value or the
    /// HTTP client cannot be initialized.
    pub fn new(config: &ConnectConfig) -> Result<Self> {
        let auth_header = config
            .api_token
            .as_deref()
            .map(|token| {
                HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
                    Error::Validation(ValidationError::InvalidInput(format!(
                        "Invalid API token format: {}",
                        e
                    )))
                })
            })
            .transpose()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to initialize HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(auth) = &self.auth_header {
            headers.insert(AUTHORIZATION, auth.clone());
        }
        headers
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn get_req(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("[AccountDesk] GET {}", url);
        self.client.get(url).headers(self.headers())
    }

    fn post_req(&self, path: &str, body: serde_json::Value) -> RequestBuilder {
        let url = self.url(path);
        debug!("[AccountDesk] POST {}", url);
        self.client.post(url).headers(self.headers()).json(&body)
    }

    fn patch_req(&self, path: &str, body: serde_json::Value) -> RequestBuilder {
        let url = self.url(path);
        debug!("[AccountDesk] PATCH {}", url);
        self.client.patch(url).headers(self.headers()).json(&body)
    }

    fn delete_req(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("[AccountDesk] DELETE {}", url);
        self.client.delete(url).headers(self.headers())
    }

    /// Sends the request and returns the envelope's `data`, if any.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>> {
        self.send_envelope(request).await.map(|envelope| envelope.data)
    }

    async fn send_envelope<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiEnvelope<T>> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Unavailable(format!("Request failed: {}", e)))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Unavailable(format!("Failed to read response: {}", e)))?;
        parse_response(status, &body)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .ok_or_else(|| Error::Unexpected("Response carried no data".to_string()))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<()> {
        self.send::<serde_json::Value>(request).await.map(|_| ())
    }
}

/// Parses a response body and returns its `data`.
fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<Option<T>> {
    parse_response(status, body).map(|envelope| envelope.data)
}

/// Parses a response body, mapping failures through [`map_api_error`].
fn parse_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<ApiEnvelope<T>> {
    if !status.is_success() {
        return Err(map_api_error(status, body));
    }
    let envelope: ApiEnvelope<T> = serde_json::from_str(body).map_err(|e| {
        Error::Unexpected(format!(
            "Failed to parse response: {} - {}",
            e,
            body.chars().take(200).collect::<String>()
        ))
    })?;
    if !envelope.success {
        return Err(map_api_error(status, body));
    }
    Ok(envelope)
}

// ─────────────────────────────────────────────────────────────────────────────
// AccountRemoteTrait Implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl AccountRemoteTrait for AccountDeskClient {
    async fn search_accounts(&self, query: &str, page_size: u32) -> Result<Vec<Account>> {
        let path = format!(
            "/accounts?search={}&page_size={}",
            urlencoding::encode(query),
            page_size
        );
        let accounts: Vec<ApiAccount> = self.fetch(self.get_req(&path)).await?;
        Ok(accounts.into_iter().map(Account::from).collect())
    }

    async fn get_account(&self, account_id: i64) -> Result<Account> {
        let account: ApiAccount = self
            .fetch(self.get_req(&format!("/accounts/{}", account_id)))
            .await?;
        Ok(account.into())
    }

    /// Walks every page of the listing.
    async fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        let mut params = vec![format!("page_size={}", LIST_PAGE_SIZE)];
        if let Some(account_type) = filter.account_type {
            params.push(format!("account_type={}", account_type));
        }
        if let Some(is_active) = filter.is_active {
            params.push(format!("is_active={}", is_active));
        }
        let query = params.join("&");

        let mut accounts = Vec::new();
        let mut page = 1;
        loop {
            let path = format!("/accounts?{}&page={}", query, page);
            let envelope: ApiEnvelope<Vec<ApiAccount>> =
                self.send_envelope(self.get_req(&path)).await?;
            let rows = envelope.data.unwrap_or_default();
            let fetched = rows.len();
            accounts.extend(rows.into_iter().map(Account::from));

            match envelope.meta {
                Some(meta) if meta.has_next() && fetched > 0 => {
                    debug!(
                        "[AccountDesk] Listed {}/{} accounts, fetching page {}",
                        accounts.len(),
                        meta.total,
                        page + 1
                    );
                    page += 1;
                }
                _ => break,
            }
        }
        Ok(accounts)
    }

    async fn create_account(&self, new_account: &NewAccount) -> Result<Account> {
        let body = serde_json::to_value(new_account)?;
        let created: ApiCreated = self.fetch(self.post_req("/accounts", body)).await?;
        self.get_account(created.id).await
    }

    async fn update_account(&self, account_id: i64, patch: &AccountUpdate) -> Result<Account> {
        let body = serde_json::to_value(patch)?;
        self.execute(self.patch_req(&format!("/accounts/{}", account_id), body))
            .await?;
        self.get_account(account_id).await
    }

    async fn dependent_counts(&self, account_id: i64) -> Result<DependentCounts> {
        let detail: ApiAccountDetail = self
            .fetch(self.get_req(&format!("/accounts/{}", account_id)))
            .await?;
        Ok(detail.into())
    }

    async fn deactivate_account(&self, account_id: i64) -> Result<Account> {
        self.execute(self.patch_req(
            &format!("/accounts/{}", account_id),
            json!({ "is_active": false }),
        ))
        .await?;
        self.get_account(account_id).await
    }

    async fn deactivate_dealer(
        &self,
        account_id: i64,
        command: &DealerDeactivationCommand,
    ) -> Result<DeactivationOutcome> {
        let body = serde_json::to_value(ApiDealerDeactivation::from(command))?;
        let outcome: Option<DeactivationOutcome> = self
            .send(self.post_req(&format!("/accounts/{}/deactivate", account_id), body))
            .await?;
        Ok(outcome.unwrap_or_default())
    }

    async fn reactivate_dealer(&self, account_id: i64, reason: &str) -> Result<Account> {
        self.execute(self.post_req(
            &format!("/accounts/{}/reactivate", account_id),
            json!({ "reason": reason }),
        ))
        .await?;
        self.get_account(account_id).await
    }

    async fn transfer_history(&self, account_id: i64) -> Result<Vec<TransferRecord>> {
        let records: Vec<ApiTransferRecord> = self
            .fetch(self.get_req(&format!("/accounts/{}/transfer-history", account_id)))
            .await?;
        records.into_iter().map(TransferRecord::try_from).collect()
    }

    async fn soft_delete_account(&self, account_id: i64) -> Result<()> {
        self.execute(self.delete_req(&format!("/accounts/{}", account_id)))
            .await
    }

    async fn restore_account(&self, account_id: i64, is_active: bool) -> Result<Account> {
        self.execute(self.patch_req(
            &format!("/accounts/{}", account_id),
            json!({ "is_deleted": false, "is_active": is_active }),
        ))
        .await?;
        self.get_account(account_id).await
    }

    async fn purge_account(&self, account_id: i64) -> Result<()> {
        self.execute(self.delete_req(&format!("/accounts/{}?permanent=true", account_id)))
            .await
    }

    async fn convert_account_type(
        &self,
        account_id: i64,
        new_type: AccountType,
        reason: &str,
    ) -> Result<Account> {
        self.execute(self.post_req(
            &format!("/accounts/{}/convert-type", account_id),
            json!({ "new_type": new_type, "reason": reason }),
        ))
        .await?;
        self.get_account(account_id).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ContactRemoteTrait Implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ContactRemoteTrait for AccountDeskClient {
    async fn list_contacts(&self, account_id: i64, include_inactive: bool) -> Result<Vec<Contact>> {
        let path = format!(
            "/accounts/{}/contacts?include_inactive={}",
            account_id, include_inactive
        );
        let rows: Vec<serde_json::Map<String, serde_json::Value>> =
            self.fetch(self.get_req(&path)).await?;
        rows.into_iter()
            .map(|row| contact_with_account(row, account_id))
            .collect()
    }

    async fn get_contact(&self, contact_id: i64) -> Result<Contact> {
        self.fetch(self.get_req(&format!("/contacts/{}", contact_id)))
            .await
    }

    async fn create_contact(&self, account_id: i64, new_contact: NewContact) -> Result<Contact> {
        let body = serde_json::to_value(&new_contact)?;
        let created: ApiCreated = self
            .fetch(self.post_req(&format!("/accounts/{}/contacts", account_id), body))
            .await?;
        self.get_contact(created.id).await
    }

    async fn update_contact(&self, contact_id: i64, patch: ContactUpdate) -> Result<Contact> {
        let body = serde_json::to_value(&patch)?;
        self.execute(self.patch_req(&format!("/contacts/{}", contact_id), body))
            .await?;
        self.get_contact(contact_id).await
    }

    async fn deactivate_contact(&self, contact_id: i64) -> Result<Contact> {
        self.update_contact(contact_id, ContactUpdate::status(ContactStatus::Inactive))
            .await
    }
}
