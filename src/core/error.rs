/*!
Error handling for the signal runtime.

Errors are deliberately terse: cryptographic and authentication failures
never carry key material, digests or fingerprint values. Validation does not
use this type at all; it reports a typed [`RejectReason`] inside a verdict.
*/

use thiserror::Error;

/// Result type for the signal runtime
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for issuance, refresh and administrative operations
#[derive(Error, Debug)]
pub enum Error {
    /// Key agreement with the client failed (fatal to issuance, never retried)
    #[error("Key agreement failed")]
    KeyAgreement(#[source] KeyExchangeError),

    /// Cryptographic error (limited details for security)
    #[error("Cryptographic operation failed")]
    Crypto(#[source] CryptoError),

    /// Authentication error (limited details for security)
    #[error("Authentication failed")]
    Authentication(#[source] AuthError),

    /// Fewer hardware attributes than the configured minimum
    #[error("Insufficient hardware signal: {available} of {required} attributes available")]
    InsufficientHardwareSignal {
        available: usize,
        required: usize,
    },

    /// No attribute source produced a value
    #[error("Hardware fingerprint source unavailable: {0}")]
    SourceUnavailable(String),

    /// Session id is not registered
    #[error("Unknown session")]
    UnknownSession,

    /// Session is revoked (terminal)
    #[error("Session revoked")]
    SessionRevoked,

    /// Session validity window is exhausted (terminal)
    #[error("Session expired")]
    SessionExpired,

    /// Operation not allowed in the current session state
    #[error("Session not in correct state: expected {expected}, but was {actual}")]
    InvalidState {
        expected: String,
        actual: String,
    },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Binding record or grant bytes could not be parsed
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Algorithm identifier not recognised
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Cryptographic errors with limited details to prevent leaking information
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// Key derivation error
    #[error("Key derivation failed")]
    KeyDerivationFailed,

    /// Signing the binding record failed
    #[error("Signing failed")]
    SigningFailed,

    /// Invalid key format
    #[error("Invalid key format")]
    InvalidKeyFormat,
}

/// Authentication errors with limited details to prevent leaking information
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Binding signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Fingerprint presented by the device does not match the signed binding
    #[error("Fingerprint binding mismatch")]
    BindingMismatch,

    /// Grant belongs to a different session
    #[error("Session mismatch")]
    SessionMismatch,
}

/// Key exchange errors with limited details to prevent leaking information
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyExchangeError {
    /// Key encapsulation failed
    #[error("Key encapsulation failed")]
    EncapsulationFailed,

    /// Key decapsulation failed
    #[error("Key decapsulation failed")]
    DecapsulationFailed,

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid ciphertext
    #[error("Invalid ciphertext")]
    InvalidCiphertext,

    /// Invalid secret key
    #[error("Invalid secret key")]
    InvalidSecretKey,
}

impl From<KeyExchangeError> for Error {
    fn from(err: KeyExchangeError) -> Self {
        Error::KeyAgreement(err)
    }
}

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        Error::Crypto(err)
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        Error::Authentication(err)
    }
}

/// Why a presented signal was not accepted.
///
/// These are local, deterministic outcomes of `validate`; none of them
/// escapes the validation boundary as an [`Error`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Session id is not registered (or was purged)
    #[error("unknown session")]
    UnknownSession,

    /// Signal fields could not be parsed
    #[error("malformed signal")]
    MalformedSignal,

    /// Presented epoch is outside the skew tolerance
    #[error("epoch out of range")]
    EpochOutOfRange,

    /// Digest does not match the expected value
    #[error("signature mismatch")]
    SignatureMismatch,

    /// (epoch, sequence) was already accepted or is too old
    #[error("replay rejected")]
    ReplayRejected,

    /// Session is revoked
    #[error("session revoked")]
    SessionRevoked,

    /// Session validity window is exhausted
    #[error("session expired")]
    SessionExpired,

    /// This validation pushed the anomaly score over the threshold
    #[error("anomaly threshold breached")]
    AnomalyThresholdBreached,
}

impl RejectReason {
    /// Stable machine-readable code, used in logs and audit exports
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::UnknownSession => "unknown_session",
            RejectReason::MalformedSignal => "malformed_signal",
            RejectReason::EpochOutOfRange => "epoch_out_of_range",
            RejectReason::SignatureMismatch => "signature_mismatch",
            RejectReason::ReplayRejected => "replay_rejected",
            RejectReason::SessionRevoked => "session_revoked",
            RejectReason::SessionExpired => "session_expired",
            RejectReason::AnomalyThresholdBreached => "anomaly_threshold",
        }
    }

    /// Whether the session can never accept a signal again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RejectReason::SessionRevoked
                | RejectReason::SessionExpired
                | RejectReason::AnomalyThresholdBreached
        )
    }

    /// Whether the rejection counts against the session's anomaly score
    pub fn is_scored(&self) -> bool {
        matches!(
            self,
            RejectReason::EpochOutOfRange
                | RejectReason::SignatureMismatch
                | RejectReason::ReplayRejected
        )
    }

    /// OAuth 2.0 error code the compatibility layer should surface.
    ///
    /// Every rejection is an invalid bearer credential from the resource
    /// server's point of view.
    pub fn oauth_error(&self) -> &'static str {
        "invalid_token"
    }
}

impl From<Error> for RejectReason {
    fn from(err: Error) -> Self {
        match err {
            Error::SessionRevoked => RejectReason::SessionRevoked,
            Error::SessionExpired => RejectReason::SessionExpired,
            Error::UnknownSession => RejectReason::UnknownSession,
            _ => RejectReason::MalformedSignal,
        }
    }
}

/// Convert a string to an Error::InvalidFormat
pub fn format_err<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(Error::InvalidFormat(msg.into()))
}

/// Create an invalid state error
#[macro_export]
macro_rules! invalid_state_err {
    ($expected:expr, $actual:expr) => {
        Err($crate::core::error::Error::InvalidState {
            expected: $expected.to_string(),
            actual: $actual.to_string(),
        })
    };
}

/// Create a key exchange error
#[macro_export]
macro_rules! key_exchange_err {
    ($err:expr) => {
        Err($crate::core::error::Error::KeyAgreement($err))
    };
}

/// Create a configuration error
#[macro_export]
macro_rules! config_err {
    ($msg:expr) => {
        Err($crate::core::error::Error::InvalidConfig($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        Err($crate::core::error::Error::InvalidConfig(format!($fmt, $($arg)*)))
    };
}
