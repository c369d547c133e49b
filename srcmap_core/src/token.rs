use rand::RngCore;
use rand::rngs::OsRng;

/// Number of random bytes behind each generated token. 64 bits keeps the
/// collision probability negligible for any realistic repository.
pub const TOKEN_BYTES: usize = 8;

/// Generate a fresh opaque token: 8 cryptographically random bytes encoded
/// with the base-58 alphabet, so tokens stay short, alphanumeric, and free of
/// ambiguous characters.
pub fn generate_token() -> String {
	let mut buf = [0u8; TOKEN_BYTES];
	OsRng.fill_bytes(&mut buf);
	bs58::encode(buf).into_string()
}
