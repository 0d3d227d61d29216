/*!
Signed binding record.

The binding record ties a session id to its principal, the fingerprint
binding, the client's public key and the negotiated algorithms. It is
signed once at issuance; the device verifies it before trusting the grant.

Encoding (big-endian):
- label (length-prefixed)
- version (1 byte)
- session id (16 bytes)
- principal (u16 length + UTF-8)
- fingerprint binding (32 bytes)
- SHA-256 of the client public key (32 bytes)
- key agreement id, signature id, trust (1 byte each)
- issued at, not before, not after, window size (u64 each)
*/

use byteorder::{BigEndian, ByteOrder};
use sha2::{Digest, Sha256};

use super::window::ValidityWindow;
use crate::core::constants::{VERSION, labels, sizes};
use crate::core::crypto::types::{KeyAgreementAlgorithm, SignatureAlgorithm};
use crate::core::error::{Error, Result, format_err};
use crate::core::fingerprint::{FingerprintBinding, TrustLevel};
use crate::core::signal::SessionId;

/// Longest principal the encoding can carry
pub const MAX_PRINCIPAL_BYTES: usize = u16::MAX as usize;

/// SHA-256 of a public key
pub fn hash_public_key(public_key: &[u8]) -> [u8; 32] {
    Sha256::digest(public_key).into()
}

/// Everything the runtime commits to at issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRecord {
    pub version: u8,
    pub session_id: SessionId,
    pub principal: String,
    pub fingerprint: FingerprintBinding,
    pub client_key_hash: [u8; 32],
    pub key_agreement: KeyAgreementAlgorithm,
    pub signature: SignatureAlgorithm,
    pub trust: TrustLevel,
    pub issued_at_ms: u64,
    pub window: ValidityWindow,
    pub window_size_ms: u64,
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    let mut buf = [0u8; 8];
    BigEndian::write_u64(&mut buf, value);
    out.extend_from_slice(&buf);
}

fn trust_id(trust: TrustLevel) -> u8 {
    match trust {
        TrustLevel::Full => 0x01,
        TrustLevel::Degraded => 0x02,
    }
}

fn key_agreement_from_id(id: u8) -> Option<KeyAgreementAlgorithm> {
    KeyAgreementAlgorithm::ALL.into_iter().find(|alg| alg.id() == id)
}

fn signature_from_id(id: u8) -> Option<SignatureAlgorithm> {
    SignatureAlgorithm::ALL.into_iter().find(|alg| alg.id() == id)
}

/// Sequential reader over a record buffer
struct Cursor<'a> {
    bytes: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.bytes.len() < n {
            return format_err("Binding record truncated");
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }
}

impl BindingRecord {
    /// Canonical bytes that get signed
    pub fn to_bytes(&self) -> Vec<u8> {
        let principal = self.principal.as_bytes();
        let mut out = Vec::with_capacity(
            labels::BINDING_RECORD.len() + sizes::SESSION_ID_BYTES + principal.len() + 112,
        );

        out.push(labels::BINDING_RECORD.len() as u8);
        out.extend_from_slice(labels::BINDING_RECORD);
        out.push(self.version);
        out.extend_from_slice(self.session_id.as_bytes());

        let mut len = [0u8; 2];
        BigEndian::write_u16(&mut len, principal.len() as u16);
        out.extend_from_slice(&len);
        out.extend_from_slice(principal);

        out.extend_from_slice(self.fingerprint.as_bytes());
        out.extend_from_slice(&self.client_key_hash);
        out.push(self.key_agreement.id());
        out.push(self.signature.id());
        out.push(trust_id(self.trust));

        put_u64(&mut out, self.issued_at_ms);
        put_u64(&mut out, self.window.not_before_ms);
        put_u64(&mut out, self.window.not_after_ms);
        put_u64(&mut out, self.window_size_ms);
        out
    }

    /// Parse canonical bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor { bytes };

        let label_len = cursor.u8()? as usize;
        if cursor.take(label_len)? != labels::BINDING_RECORD {
            return format_err("Not a binding record");
        }

        let version = cursor.u8()?;
        if version != VERSION {
            return format_err(format!("Unsupported binding record version: {}", version));
        }

        let session_id = SessionId::from_bytes(cursor.array()?);
        let principal_len = cursor.u16()? as usize;
        let principal = String::from_utf8(cursor.take(principal_len)?.to_vec())
            .map_err(|_| Error::InvalidFormat("Principal is not UTF-8".into()))?;
        let fingerprint = FingerprintBinding::from_bytes(cursor.array()?);
        let client_key_hash = cursor.array()?;

        let key_agreement = key_agreement_from_id(cursor.u8()?)
            .ok_or_else(|| Error::InvalidFormat("Unknown key agreement id".into()))?;
        let signature = signature_from_id(cursor.u8()?)
            .ok_or_else(|| Error::InvalidFormat("Unknown signature id".into()))?;
        let trust = match cursor.u8()? {
            0x01 => TrustLevel::Full,
            0x02 => TrustLevel::Degraded,
            other => return format_err(format!("Unknown trust level: {}", other)),
        };

        let issued_at_ms = cursor.u64()?;
        let window = ValidityWindow {
            not_before_ms: cursor.u64()?,
            not_after_ms: cursor.u64()?,
        };
        let window_size_ms = cursor.u64()?;

        if !cursor.bytes.is_empty() {
            return format_err("Trailing bytes after binding record");
        }

        Ok(Self {
            version,
            session_id,
            principal,
            fingerprint,
            client_key_hash,
            key_agreement,
            signature,
            trust,
            issued_at_ms,
            window,
            window_size_ms,
        })
    }
}
