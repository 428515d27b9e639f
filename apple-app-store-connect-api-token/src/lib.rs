//! [Doc](https://developer.apple.com/documentation/appstoreconnectapi/generating_tokens_for_api_requests)

use core::time::Duration;
use std::{fs, io::Error as IoError, path::Path};

use chrono::{serde::ts_seconds, DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, errors::Error as JsonwebtokenError, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

pub const AUDIENCE: &str = "appstoreconnect-v1";
// 20 minutes
pub const LIFETIME_SECONDS_MAX: u64 = 60 * 20;

//
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    pub iss: Box<str>,
    #[serde(with = "ts_seconds")]
    pub iat: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub exp: DateTime<Utc>,
    pub aud: Box<str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Vec<Box<str>>>,
}

/// API key material issued by App Store Connect (Users and Access > Keys).
#[derive(Clone)]
pub struct Credentials {
    pub issuer_id: Box<str>,
    pub key_id: Box<str>,
    pub private_key_pem: Box<str>,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("issuer_id", &self.issuer_id)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(
        issuer_id: impl AsRef<str>,
        key_id: impl AsRef<str>,
        private_key_pem: impl AsRef<str>,
    ) -> Self {
        Self {
            issuer_id: issuer_id.as_ref().into(),
            key_id: key_id.as_ref().into(),
            private_key_pem: private_key_pem.as_ref().into(),
        }
    }

    /// Reads the `AuthKey_XXXXXXXXXX.p8` file as text.
    pub fn from_key_file(
        issuer_id: impl AsRef<str>,
        key_id: impl AsRef<str>,
        path: impl AsRef<Path>,
    ) -> Result<Self, CreateError> {
        let pem = fs::read_to_string(path.as_ref()).map_err(CreateError::ReadKeyFailed)?;
        Ok(Self::new(issuer_id, key_id, pem))
    }

    pub fn claims(
        &self,
        issued_at: impl Into<Option<DateTime<Utc>>>,
        lifetime: impl Into<Option<Duration>>,
    ) -> Claims {
        let issued_at = issued_at.into().unwrap_or_else(Utc::now);
        let mut lifetime = lifetime
            .into()
            .unwrap_or_else(|| Duration::from_secs(LIFETIME_SECONDS_MAX));
        if lifetime.as_secs() > LIFETIME_SECONDS_MAX {
            lifetime = Duration::from_secs(LIFETIME_SECONDS_MAX);
        }

        Claims {
            iss: self.issuer_id.clone(),
            iat: issued_at,
            exp: issued_at + ChronoDuration::seconds(lifetime.as_secs() as i64),
            aud: AUDIENCE.into(),
            scope: None,
        }
    }

    pub fn sign(
        &self,
        issued_at: impl Into<Option<DateTime<Utc>>>,
        lifetime: impl Into<Option<Duration>>,
    ) -> Result<Box<str>, CreateError> {
        sign_claims(&self.key_id, self.private_key_pem.as_bytes(), &self.claims(issued_at, lifetime))
    }
}

pub fn sign_claims(
    key_id: impl AsRef<str>,
    auth_key_p8_bytes: impl AsRef<[u8]>,
    claims: &Claims,
) -> Result<Box<str>, CreateError> {
    let key = EncodingKey::from_ec_pem(auth_key_p8_bytes.as_ref())
        .map_err(CreateError::MakeEncodingKeyFailed)?;

    let mut header = Header::new(Algorithm::ES256);
    header.typ = Some("JWT".to_owned());
    header.kid = Some(key_id.as_ref().to_owned());

    let token = encode(&header, claims, &key).map_err(CreateError::EncodeFailed)?;

    Ok(token.as_str().into())
}

#[derive(Debug)]
pub enum CreateError {
    ReadKeyFailed(IoError),
    MakeEncodingKeyFailed(JsonwebtokenError),
    EncodeFailed(JsonwebtokenError),
}
impl core::fmt::Display for CreateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}
impl std::error::Error for CreateError {}
