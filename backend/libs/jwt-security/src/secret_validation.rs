//! Signing secret validation
//!
//! The HS256 secret is shared by the issuer and every validating service. A
//! weak one is a startup-time fatal error, never a runtime one.

use crate::error::AuthError;
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;
use tracing::warn;
use zeroize::Zeroizing;

pub const MIN_SECRET_LENGTH: usize = 32; // 256 bits minimum
const RECOMMENDED_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_BYTE: f64 = 4.0;

/// Secret strength classification
#[derive(Debug, PartialEq, Eq)]
pub enum SecretStrength {
    /// Rejected, with the reason
    Weak(&'static str),
    /// Usable, startup logs a warning
    Acceptable,
    Strong,
}

/// Classify a candidate HS256 secret.
///
/// **Criteria**:
/// - Minimum 32 bytes
/// - Shannon entropy >= 4.0 bits/byte
/// - No runs of 4+ identical or sequential bytes
pub fn validate_secret_strength(secret: &[u8]) -> SecretStrength {
    if secret.len() < MIN_SECRET_LENGTH {
        return SecretStrength::Weak("secret must be at least 32 bytes");
    }

    let entropy = calculate_shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_BYTE {
        return SecretStrength::Weak("secret entropy is too low");
    }

    if has_obvious_patterns(secret) {
        return SecretStrength::Weak("secret contains repeated or sequential runs");
    }

    if secret.len() >= RECOMMENDED_SECRET_LENGTH && entropy >= 5.0 {
        SecretStrength::Strong
    } else {
        SecretStrength::Acceptable
    }
}

/// Validated symmetric signing secret.
///
/// Construction is the only place the strength rules run, so holding a
/// `SigningSecret` proves the secret passed them. The bytes are wiped on drop.
#[derive(Clone)]
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        let bytes = secret.as_ref();
        match validate_secret_strength(bytes) {
            SecretStrength::Weak(reason) => Err(AuthError::WeakSigningSecret(reason.to_string())),
            SecretStrength::Acceptable => {
                warn!(
                    length = bytes.len(),
                    "Signing secret is acceptable but not strong; 64+ random bytes recommended"
                );
                Ok(Self(Zeroizing::new(bytes.to_vec())))
            }
            SecretStrength::Strong => Ok(Self(Zeroizing::new(bytes.to_vec()))),
        }
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Shannon entropy in bits per byte (0-8 scale)
fn calculate_shannon_entropy(data: &[u8]) -> f64 {
    let mut freq = [0u32; 256];
    let len = data.len() as f64;

    for &byte in data {
        freq[byte as usize] += 1;
    }

    freq.iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Runs of 4+ identical bytes ("aaaa") or ascending bytes ("1234")
fn has_obvious_patterns(data: &[u8]) -> bool {
    let mut same = 1;
    let mut ascending = 1;

    for window in data.windows(2) {
        same = if window[0] == window[1] { same + 1 } else { 1 };
        ascending = if window[1] as i16 - window[0] as i16 == 1 {
            ascending + 1
        } else {
            1
        };

        if same >= 4 || ascending >= 4 {
            return true;
        }
    }

    false
}

/// Generate a random base64 secret of `length` random bytes.
///
/// Intended for provisioning scripts and tests.
pub fn generate_secure_secret(length: usize) -> Result<String, AuthError> {
    if length < MIN_SECRET_LENGTH {
        return Err(AuthError::Configuration(format!(
            "secret length must be at least {} bytes",
            MIN_SECRET_LENGTH
        )));
    }

    let rng = SystemRandom::new();
    let mut buffer = Zeroizing::new(vec![0u8; length]);
    rng.fill(&mut buffer)
        .map_err(|_| AuthError::Internal("failed to generate random bytes".to_string()))?;

    use base64::{engine::general_purpose::STANDARD, Engine};
    Ok(STANDARD.encode(buffer.as_slice()))
}
