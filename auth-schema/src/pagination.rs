//! Page size and continuation tokens for schema version listing.
//!
//! A token marks the first row a listing did not return. It is opaque to clients:
//! JSON encoded, then URL-safe base64 without padding. The empty string is the
//! "no more pages" token and is also accepted as "start from the beginning".

use crate::error::{Result, SchemaError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Listing window requested by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    page_size: u32,
    token: EncodedContinuationToken,
}

impl Pagination {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            token: EncodedContinuationToken::noop(),
        }
    }

    pub fn with_token(mut self, token: impl Into<EncodedContinuationToken>) -> Self {
        self.token = token.into();
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn token(&self) -> &EncodedContinuationToken {
        &self.token
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Resume position inside one tenant's version index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationPosition {
    pub tenant_id: String,
    pub version: String,
    pub name: String,
}

/// Decoded continuation token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationToken {
    /// No further pages, or no position to resume from.
    Noop,
    Position(ContinuationPosition),
}

impl ContinuationToken {
    pub fn at(tenant_id: &str, version: &str, name: &str) -> Self {
        ContinuationToken::Position(ContinuationPosition {
            tenant_id: tenant_id.to_string(),
            version: version.to_string(),
            name: name.to_string(),
        })
    }

    pub fn encode(&self) -> Result<EncodedContinuationToken> {
        match self {
            ContinuationToken::Noop => Ok(EncodedContinuationToken::noop()),
            ContinuationToken::Position(position) => {
                let json = serde_json::to_vec(position).map_err(|e| {
                    SchemaError::InternalError(anyhow::anyhow!("encode continuation token: {}", e))
                })?;
                Ok(EncodedContinuationToken(URL_SAFE_NO_PAD.encode(json)))
            }
        }
    }

    /// Where a listing for `tenant_id` should resume, `None` to start at the beginning.
    pub fn position_for(&self, tenant_id: &str) -> Result<Option<&ContinuationPosition>> {
        match self {
            ContinuationToken::Noop => Ok(None),
            ContinuationToken::Position(position) if position.tenant_id == tenant_id => {
                Ok(Some(position))
            }
            ContinuationToken::Position(_) => Err(SchemaError::InvalidContinuationToken(
                "token was issued for a different tenant".to_string(),
            )),
        }
    }
}

/// Token as handed to and received from clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedContinuationToken(String);

impl EncodedContinuationToken {
    pub fn noop() -> Self {
        Self(String::new())
    }

    pub fn is_noop(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn decode(&self) -> Result<ContinuationToken> {
        if self.is_noop() {
            return Ok(ContinuationToken::Noop);
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(self.0.as_bytes())
            .map_err(|e| SchemaError::InvalidContinuationToken(e.to_string()))?;
        let position: ContinuationPosition = serde_json::from_slice(&bytes)
            .map_err(|e| SchemaError::InvalidContinuationToken(e.to_string()))?;
        Ok(ContinuationToken::Position(position))
    }
}

impl From<String> for EncodedContinuationToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EncodedContinuationToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for EncodedContinuationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
