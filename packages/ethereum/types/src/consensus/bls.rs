//! BLS types as they appear in beacon API payloads. Signatures are never verified here.

use alloy_primitives::FixedBytes;

/// The length of a compressed BLS12-381 public key
pub const BLS_PUBLIC_KEY_BYTES_LEN: usize = 48;
/// The length of a compressed BLS12-381 signature
pub const BLS_SIGNATURE_BYTES_LEN: usize = 96;

/// A compressed BLS public key
pub type BlsPublicKey = FixedBytes<BLS_PUBLIC_KEY_BYTES_LEN>;
/// A compressed BLS signature
pub type BlsSignature = FixedBytes<BLS_SIGNATURE_BYTES_LEN>;
