//! HMAC-SHA256 signing and constant-time verification.

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes the HMAC-SHA256 digest of `message` under `secret`.
pub fn sign(secret: &[u8], message: &[u8]) -> Vec<u8> {
	let mut mac = keyed(secret);

	mac.update(message);

	mac.finalize().into_bytes().to_vec()
}

/// Returns `true` when `signature` is the HMAC-SHA256 digest of `message` under `secret`.
///
/// The comparison runs in constant time, so a mismatch leaks nothing about how many leading
/// bytes matched.
pub fn verify(secret: &[u8], signature: &[u8], message: &[u8]) -> bool {
	let mut mac = keyed(secret);

	mac.update(message);

	mac.verify_slice(signature).is_ok()
}

fn keyed(secret: &[u8]) -> HmacSha256 {
	// HMAC accepts keys of any length; oversized keys are hashed first.
	match HmacSha256::new_from_slice(secret) {
		Ok(mac) => mac,
		Err(_) => unreachable!("HMAC-SHA256 accepts keys of every length."),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn verify_accepts_matching_digest() {
		let digest = sign(b"53cr3tz", b"payload");

		assert_eq!(digest.len(), 32);
		assert!(verify(b"53cr3tz", &digest, b"payload"));
	}

	#[test]
	fn verify_rejects_other_secret_message_and_truncation() {
		let digest = sign(b"53cr3tz", b"payload");

		assert!(!verify(b"other", &digest, b"payload"));
		assert!(!verify(b"53cr3tz", &digest, b"payload2"));
		assert!(!verify(b"53cr3tz", &digest[..31], b"payload"));
		assert!(!verify(b"53cr3tz", b"", b"payload"));
	}

	#[test]
	fn empty_secret_is_a_valid_key() {
		let digest = sign(b"", b"payload");

		assert!(verify(b"", &digest, b"payload"));
	}
}
