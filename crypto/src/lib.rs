//! Cryptographic primitives for the Acre DAO.
//!
//! - **Ed25519** for signing and signature verification
//! - **Blake2b** for hashing (address checksums, structured digests)
//! - Address derivation with `acre_` prefix and base32 encoding
//! - Domain-separated structured digests for vote / delegation / permit
//!   messages produced off-chain and verified by the engine

pub mod address;
pub mod digest;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::{decode_address, derive_address, validate_address};
pub use digest::{delegation_digest, domain_separator, permit_digest, vote_digest};
pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
