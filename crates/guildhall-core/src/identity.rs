//! Deterministic stream identifiers for aggregates keyed by natural keys.
//!
//! Nests and merchants are addressed by name and Discord id respectively;
//! their event streams live under UUID v5 ids derived from those keys so that
//! every writer agrees on the stream without a lookup table.

use uuid::Uuid;

/// Namespace for nest roster streams.
pub const NEST_NAMESPACE: Uuid = Uuid::from_u128(0x6a1f_5b0e_3c2d_4e8f_9a7b_1c2d_3e4f_5a6b);

/// Namespace for merchant streams.
pub const MERCHANT_NAMESPACE: Uuid = Uuid::from_u128(0x2b3c_4d5e_6f70_4182_93a4_b5c6_d7e8_f901);

/// Derives a stream id for `key` within `namespace`.
#[must_use]
pub fn derived_stream_id(namespace: &Uuid, key: &str) -> Uuid {
    Uuid::new_v5(namespace, key.as_bytes())
}
