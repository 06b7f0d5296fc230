//! HMAC-SHA256 message authentication.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::SigningSecret;

type HmacSha256 = Hmac<Sha256>;

/// Length in bytes of every signature produced by [`Signer::sign`].
pub const SIGNATURE_LEN: usize = 32;

/// Signs and verifies byte strings with the process signing secret.
#[derive(Clone)]
pub struct Signer {
    secret: SigningSecret,
}

impl Signer {
    pub fn new(secret: SigningSecret) -> Self {
        Self { secret }
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length; SigningSecret rejects empty ones.
        HmacSha256::new_from_slice(self.secret.expose()).expect("HMAC accepts any key length")
    }

    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        let mut mac = self.mac();
        mac.update(message);
        let mut out = [0u8; SIGNATURE_LEN];
        out.copy_from_slice(&mac.finalize().into_bytes());
        out
    }

    /// Constant-time check of `signature` against the MAC of `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let mut mac = self.mac();
        mac.update(message);
        mac.verify_slice(signature).is_ok()
    }
}

impl core::fmt::Debug for Signer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}
