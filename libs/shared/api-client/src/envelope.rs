use serde::{de, Deserialize, Deserializer};

/// Response shapes the appointment API is known to return.
///
/// Some endpoints wrap their payload as `{ "success": true, "data": ... }`,
/// others return it bare, and failures come back as
/// `{ "success": false, "error": "..." }`. Deserializing into this type
/// narrows the body once at the boundary instead of probing fields later.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ApiEnvelope<T> {
    Data { data: T },
    Failure {
        success: Unsuccessful,
        #[serde(alias = "message")]
        error: String,
    },
    Bare(T),
}

/// Matches only `"success": false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsuccessful;

impl<'de> Deserialize<'de> for Unsuccessful {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if bool::deserialize(deserializer)? {
            Err(de::Error::custom("expected `success: false`"))
        } else {
            Ok(Unsuccessful)
        }
    }
}

impl<T> ApiEnvelope<T> {
    pub fn into_result(self) -> Result<T, String> {
        match self {
            ApiEnvelope::Data { data } | ApiEnvelope::Bare(data) => Ok(data),
            ApiEnvelope::Failure { error, .. } => Err(error),
        }
    }
}
