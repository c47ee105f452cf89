//! Domain-separated structured digests for off-chain signed actions.
//!
//! Each message type gets its own tag, and every digest is bound to a DAO
//! domain (name + treasury address) so a signature produced for one DAO can
//! never be replayed against another. Integers are encoded big-endian,
//! fixed width; the variable-length DAO name is length-framed inside the
//! domain separator.

use crate::hash::blake2b_256_multi;
use acre_types::{MemberAddress, Timestamp};

const DOMAIN_TAG: &[u8] = b"ACRE_DOMAIN_V1";
const VOTE_TAG: &[u8] = b"ACRE_VOTE";
const DELEGATION_TAG: &[u8] = b"ACRE_DELEGATION";
const PERMIT_TAG: &[u8] = b"ACRE_PERMIT";

/// Compute the domain separator binding signed messages to one DAO.
pub fn domain_separator(dao_name: &str, dao_address: &MemberAddress) -> [u8; 32] {
    blake2b_256_multi(&[
        DOMAIN_TAG,
        &(dao_name.len() as u64).to_be_bytes(),
        dao_name.as_bytes(),
        dao_address.as_str().as_bytes(),
    ])
}

/// Digest a vote-by-signature message over `(signer, proposal_id, approve)`.
pub fn vote_digest(
    domain: &[u8; 32],
    signer: &MemberAddress,
    proposal_id: u64,
    approve: bool,
) -> [u8; 32] {
    blake2b_256_multi(&[
        VOTE_TAG,
        domain,
        signer.as_str().as_bytes(),
        &proposal_id.to_be_bytes(),
        &[approve as u8],
    ])
}

/// Digest a delegate-by-signature message over `(delegatee, nonce, expiry)`.
pub fn delegation_digest(
    domain: &[u8; 32],
    delegatee: &MemberAddress,
    nonce: u64,
    expiry: Timestamp,
) -> [u8; 32] {
    blake2b_256_multi(&[
        DELEGATION_TAG,
        domain,
        delegatee.as_str().as_bytes(),
        &nonce.to_be_bytes(),
        &expiry.as_secs().to_be_bytes(),
    ])
}

/// Digest a funding-asset permit over `(owner, spender, value, nonce, deadline)`.
pub fn permit_digest(
    domain: &[u8; 32],
    owner: &MemberAddress,
    spender: &MemberAddress,
    value: u128,
    nonce: u64,
    deadline: Timestamp,
) -> [u8; 32] {
    blake2b_256_multi(&[
        PERMIT_TAG,
        domain,
        owner.as_str().as_bytes(),
        spender.as_str().as_bytes(),
        &value.to_be_bytes(),
        &nonce.to_be_bytes(),
        &deadline.as_secs().to_be_bytes(),
    ])
}
