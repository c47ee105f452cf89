//! Nullable funding asset — an in-memory fungible ledger with real permit
//! verification.

use acre_crypto::{decode_address, permit_digest, sign_message, verify_signature};
use acre_loot::{FundingAsset, PermitAuth, TreasuryError};
use acre_types::{KeyPair, MemberAddress, Timestamp};
use std::collections::HashMap;

/// A deterministic in-memory `FundingAsset`.
///
/// Permits are verified for real: deadline, per-owner nonce, and the
/// Ed25519 signature over the permit digest, with the owner's public key
/// recovered from their address. Replaying a consumed nonce fails.
pub struct NullFundingAsset {
    domain: [u8; 32],
    balances: HashMap<MemberAddress, u128>,
    nonces: HashMap<MemberAddress, u64>,
}

impl NullFundingAsset {
    /// `name` seeds this asset's own permit domain (distinct from any DAO
    /// signing domain).
    pub fn new(name: &str, asset_address: &MemberAddress) -> Self {
        Self {
            domain: acre_crypto::domain_separator(name, asset_address),
            balances: HashMap::new(),
            nonces: HashMap::new(),
        }
    }

    /// Seed a balance (test setup).
    pub fn credit(&mut self, holder: &MemberAddress, amount: u128) {
        *self.balances.entry(holder.clone()).or_default() += amount;
    }

    pub fn nonce_of(&self, owner: &MemberAddress) -> u64 {
        self.nonces.get(owner).copied().unwrap_or(0)
    }

    /// Produce a valid permit for the owner's current nonce (test helper;
    /// in production permits are signed off-chain).
    pub fn sign_permit(
        &self,
        owner: &MemberAddress,
        owner_keys: &KeyPair,
        spender: &MemberAddress,
        value: u128,
        deadline: Timestamp,
    ) -> PermitAuth {
        let nonce = self.nonce_of(owner);
        let digest = permit_digest(&self.domain, owner, spender, value, nonce, deadline);
        PermitAuth {
            owner: owner.clone(),
            spender: spender.clone(),
            value,
            nonce,
            deadline,
            signature: sign_message(&digest, &owner_keys.private),
        }
    }
}

impl FundingAsset for NullFundingAsset {
    fn balance_of(&self, holder: &MemberAddress) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn transfer(
        &mut self,
        from: &MemberAddress,
        to: &MemberAddress,
        amount: u128,
    ) -> Result<(), TreasuryError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TreasuryError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        *self.balances.entry(from.clone()).or_default() -= amount;
        *self.balances.entry(to.clone()).or_default() += amount;
        Ok(())
    }

    fn pull_with_permit(
        &mut self,
        auth: &PermitAuth,
        to: &MemberAddress,
        amount: u128,
        now: Timestamp,
    ) -> Result<(), TreasuryError> {
        if now > auth.deadline {
            return Err(TreasuryError::PermitExpired {
                deadline: auth.deadline,
                now,
            });
        }
        let expected = self.nonce_of(&auth.owner);
        if auth.nonce != expected {
            return Err(TreasuryError::PermitNonceMismatch {
                expected,
                got: auth.nonce,
            });
        }
        if amount > auth.value {
            return Err(TreasuryError::PermitValueTooSmall {
                value: auth.value,
                needed: amount,
            });
        }
        if *to != auth.spender {
            return Err(TreasuryError::PermitRejected);
        }
        let digest = permit_digest(
            &self.domain,
            &auth.owner,
            &auth.spender,
            auth.value,
            auth.nonce,
            auth.deadline,
        );
        let Some(public) = decode_address(&auth.owner) else {
            return Err(TreasuryError::PermitRejected);
        };
        if !verify_signature(&digest, &auth.signature, &public) {
            return Err(TreasuryError::PermitRejected);
        }
        let available = self.balance_of(&auth.owner);
        if available < amount {
            return Err(TreasuryError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        // Nothing can fail past this point; the nonce burns atomically
        // with the pull.
        self.nonces.insert(auth.owner.clone(), expected + 1);
        self.transfer(&auth.owner, to, amount)
    }
}
