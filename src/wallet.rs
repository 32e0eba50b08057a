use reqwest::StatusCode;
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;
use url::Url;

pub const ENTRY_FUNCTION_PAYLOAD_TYPE: &str = "entry_function_payload";

/// The connected account acting as the player. Normalized to a lowercase
/// `0x`-prefixed hex string of at most 32 bytes.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AccountAddress(String);

impl AccountAddress {
    pub fn parse(raw: &str) -> Result<Self, SignerError> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix("0x").ok_or_else(|| {
            SignerError::InvalidAddress {
                reason: format!("missing 0x prefix in {trimmed:?}"),
            }
        })?;
        if digits.is_empty() || digits.len() > 64 {
            return Err(SignerError::InvalidAddress {
                reason: format!("expected 1..=64 hex digits, got {}", digits.len()),
            });
        }
        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_owned()
        };
        hex::decode(&padded).map_err(|_| SignerError::InvalidAddress {
            reason: format!("non-hex characters in {trimmed:?}"),
        })?;
        Ok(AccountAddress(format!(
            "0x{}",
            digits.to_ascii_lowercase()
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for header display.
    pub fn short(&self) -> String {
        if self.0.len() <= 12 {
            self.0.clone()
        } else {
            format!("{}..{}", &self.0[..6], &self.0[self.0.len() - 4..])
        }
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntryFunctionPayload {
    #[serde(rename = "type")]
    pub payload_type: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<serde_json::Value>,
}

impl EntryFunctionPayload {
    pub fn entry_function(
        function: impl Into<String>,
        arguments: Vec<serde_json::Value>,
    ) -> Self {
        EntryFunctionPayload {
            payload_type: ENTRY_FUNCTION_PAYLOAD_TYPE.to_owned(),
            function: function.into(),
            type_arguments: Vec::new(),
            arguments,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("wallet request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("signer rejected the transaction: {reason}")]
    Rejected { reason: String },
    #[error("wallet daemon responded with {status}: {body}")]
    Daemon { status: StatusCode, body: String },
    #[error("invalid account address: {reason}")]
    InvalidAddress { reason: String },
    #[error("invalid wallet url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Seam over the external wallet provider. The wallet owns all key material
/// and signing; the client only hands it entry-function payloads.
pub trait WalletSigner {
    /// The identity currently connected, if any. `None` means the player
    /// has no usable account and the session must stay disconnected.
    fn connected_account(
        &self,
    ) -> impl Future<Output = Result<Option<AccountAddress>, SignerError>>;

    /// Signs and submits the payload, returning the pending transaction
    /// hash. Once this returns the transaction cannot be retracted.
    fn sign_and_submit(
        &self,
        payload: &EntryFunctionPayload,
    ) -> impl Future<Output = Result<String, SignerError>>;
}

/// HTTP client for a local wallet daemon, the stand-in for a browser wallet
/// extension.
#[derive(Clone)]
pub struct ExternalWallet {
    base_url: String,
    http: reqwest::Client,
}

impl ExternalWallet {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SignerError> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Url::parse(&base_url).map_err(|source| SignerError::InvalidUrl {
            url: base_url.clone(),
            source,
        })?;
        Ok(ExternalWallet {
            base_url,
            http: reqwest::Client::new(),
        })
    }
}

impl WalletSigner for ExternalWallet {
    async fn connected_account(&self) -> Result<Option<AccountAddress>, SignerError> {
        let url = format!("{}/account", self.base_url);
        let res = self.http.get(url).send().await?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SignerError::Daemon { status, body });
        }
        let dto: AccountDto = res.json().await?;
        Ok(Some(AccountAddress::parse(&dto.address)?))
    }

    async fn sign_and_submit(
        &self,
        payload: &EntryFunctionPayload,
    ) -> Result<String, SignerError> {
        let url = format!("{}/transactions", self.base_url);
        let res = self.http.post(url).json(payload).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SignerError::Rejected {
                reason: format!("{status}: {body}"),
            });
        }
        let dto: SubmitResponseDto = res.json().await?;
        Ok(dto.hash)
    }
}

impl fmt::Display for ExternalWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url)
    }
}

#[derive(Deserialize)]
struct AccountDto {
    address: String,
}

#[derive(Deserialize)]
struct SubmitResponseDto {
    hash: String,
}
