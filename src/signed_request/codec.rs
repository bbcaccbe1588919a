//! Base64URL codec used by the signed request wire format.

// crates.io
use base64::{
	DecodeError, Engine as _,
	alphabet::STANDARD,
	engine::{
		DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose::URL_SAFE_NO_PAD,
	},
};

// Padding is restored before decoding, so the engine insists on canonical padding while
// tolerating non-zero trailing bits emitted by lenient encoders.
const PADDED_STANDARD: GeneralPurpose = GeneralPurpose::new(
	&STANDARD,
	GeneralPurposeConfig::new()
		.with_decode_allow_trailing_bits(true)
		.with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

/// Decodes URL-safe base64 text whose trailing `=` padding may have been stripped.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
	let mut buf = String::with_capacity(text.len() + 3);

	buf.extend(text.chars().map(|ch| match ch {
		'-' => '+',
		'_' => '/',
		other => other,
	}));

	for _ in 0..padding_len(text.len()) {
		buf.push('=');
	}

	PADDED_STANDARD.decode(buf)
}

/// Encodes bytes as unpadded URL-safe base64 text.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
	URL_SAFE_NO_PAD.encode(bytes)
}

fn padding_len(len: usize) -> usize {
	(4 - len % 4) % 4
}
