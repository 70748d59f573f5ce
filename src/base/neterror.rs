use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NetError {
    // URL Errors
    #[error("Invalid URL")]
    InvalidUrl,

    // Cookie Errors
    #[error("Cookie prefix validation failed")]
    CookieInvalidPrefix,
    #[error("Cookie domain is a public suffix")]
    CookiePublicSuffix,
    #[error("Cookie {name:?} rejected: {reason}")]
    CookieRejected { name: String, reason: String },
    #[error("{} cookie(s) rejected", .0.len())]
    CookiesRejected(Vec<NetError>),

    // Cookie Store Errors
    #[error("Malformed cookie store key {key:?}: {reason}")]
    CookieKeyDecode { key: String, reason: String },
    #[error("Cookie store replay incomplete: {} failure(s)", .0.len())]
    ReplayIncomplete(Vec<NetError>),
    #[error("Cookie store deserialization failed: {message}")]
    CookieStoreDeserialization { message: String },
    #[error("Cookie store serialization failed: {message}")]
    CookieStoreSerialization { message: String },
    #[error("Cookie store I/O failed for {path}: {message}")]
    CookieStoreIo { path: String, message: String },

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::InvalidUrl => -300,

            NetError::CookieInvalidPrefix => -903,
            NetError::CookiePublicSuffix => -904,
            NetError::CookieRejected { .. } => -905,
            NetError::CookiesRejected(_) => -906,

            // Custom codes, outside Chromium's allocated ranges.
            NetError::CookieKeyDecode { .. } => -10100,
            NetError::ReplayIncomplete(_) => -10101,
            NetError::CookieStoreDeserialization { .. } => -10102,
            NetError::CookieStoreSerialization { .. } => -10103,
            NetError::CookieStoreIo { .. } => -10104,

            NetError::Unknown(code) => *code,
        }
    }

    /// Create a key decode error.
    pub fn key_decode(key: impl Into<String>, reason: impl Into<String>) -> Self {
        NetError::CookieKeyDecode {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a cookie rejection error.
    pub fn cookie_rejected(name: impl Into<String>, reason: impl Into<String>) -> Self {
        NetError::CookieRejected {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl std::fmt::Display) -> Self {
        NetError::CookieStoreDeserialization {
            message: message.to_string(),
        }
    }

    /// Create a serialization error.
    pub fn serialization(message: impl std::fmt::Display) -> Self {
        NetError::CookieStoreSerialization {
            message: message.to_string(),
        }
    }

    /// Failures nested inside an aggregate error, or the error itself.
    ///
    /// `CookiesRejected` and `ReplayIncomplete` are flattened one level.
    pub fn failures(&self) -> &[NetError] {
        match self {
            NetError::CookiesRejected(errors) | NetError::ReplayIncomplete(errors) => errors,
            other => std::slice::from_ref(other),
        }
    }
}

impl From<serde_json::Error> for NetError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            NetError::CookieStoreIo {
                path: "<stream>".to_string(),
                message: err.to_string(),
            }
        } else {
            NetError::deserialization(err)
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -300 => NetError::InvalidUrl,
            -903 => NetError::CookieInvalidPrefix,
            -904 => NetError::CookiePublicSuffix,
            _ => NetError::Unknown(code),
        }
    }
}
