//! Request authorization and webhook signature verification.
//!
//! The algorithm is provider-specific, so adapters depend on the [`CallbackSigner`] trait rather than on a concrete
//! hash. [`Sha512Signer`] is the CardPay scheme: callbacks are signed with the lowercase hex SHA-512 of the raw body
//! followed by the callback secret, and outbound requests carry HTTP Basic credentials built from the terminal id and
//! secret.
use digest::{generic_array::GenericArray, CtOutput, Digest};
use sha2::Sha512;

use crate::TerminalCredentials;

pub trait CallbackSigner {
    /// The `Authorization` header value for an outbound request made with these credentials.
    fn authorization(&self, credentials: &TerminalCredentials) -> String;

    /// The signature the provider is expected to attach to `raw`.
    fn sign(&self, raw: &[u8], secret: &str) -> String;

    /// Checks `signature` against `raw` in constant time. `raw` must be the body exactly as received.
    fn verify(&self, raw: &[u8], secret: &str, signature: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha512Signer;

impl Sha512Signer {
    fn digest(raw: &[u8], secret: &str) -> CtOutput<Sha512> {
        let mut hasher = Sha512::new();
        hasher.update(raw);
        hasher.update(secret.as_bytes());
        CtOutput::new(hasher.finalize())
    }
}

impl CallbackSigner for Sha512Signer {
    fn authorization(&self, credentials: &TerminalCredentials) -> String {
        let token = format!("{}:{}", credentials.terminal_id, credentials.secret.reveal());
        format!("Basic {}", base64::encode(token))
    }

    fn sign(&self, raw: &[u8], secret: &str) -> String {
        hex::encode(Self::digest(raw, secret).into_bytes())
    }

    fn verify(&self, raw: &[u8], secret: &str, signature: &str) -> bool {
        let supplied = match hex::decode(signature.trim()) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        if supplied.len() != <Sha512 as Digest>::output_size() {
            return false;
        }
        let expected = Self::digest(raw, secret);
        let supplied = CtOutput::<Sha512>::new(GenericArray::clone_from_slice(&supplied));
        expected == supplied
    }
}
