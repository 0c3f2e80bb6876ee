//! State digest for cross-node consistency.
//!
//! Every node applying the same blocks must hold the same module state.
//! The digest is a SHA-256 over the whole [`Store`] in its canonical
//! (`BTreeMap`) order, so two nodes can compare state without shipping it.

use buyback_keeper::Store;
use buyback_types::Result;
use sha2::{Digest, Sha256};

const DOMAIN: &[u8] = b"buyback:state:v1:";

fn update_json(hasher: &mut Sha256, value: &impl serde::Serialize) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(&bytes);
    Ok(())
}

/// Compute the state digest.
///
/// Covers the ID sequence, every auction, every purchase with its key,
/// params and accepted tokens, in that order.
pub fn state_digest(store: &Store) -> Result<[u8; 32]> {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN);
    hasher.update(store.next_auction_id().0.to_le_bytes());

    hasher.update((store.auctions().count() as u64).to_le_bytes());
    for auction in store.auctions() {
        update_json(&mut hasher, auction)?;
    }

    hasher.update((store.purchases().count() as u64).to_le_bytes());
    for (id, buyer, purchase) in store.purchases() {
        hasher.update(id.0.to_le_bytes());
        update_json(&mut hasher, buyer)?;
        update_json(&mut hasher, purchase)?;
    }

    update_json(&mut hasher, store.params())?;
    update_json(&mut hasher, store.accepted_tokens())?;

    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    Ok(digest)
}

/// Hex-encoded [`state_digest`].
pub fn state_digest_hex(store: &Store) -> Result<String> {
    Ok(hex::encode(state_digest(store)?))
}

/// Whether `store` hashes to `expected`.
pub fn verify_state_digest(store: &Store, expected: &[u8; 32]) -> Result<bool> {
    Ok(state_digest(store)? == *expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use buyback_keeper::testing::{buy_msg, create_msg, t0, test_keeper};
    use rust_decimal::Decimal;

    const E18: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn empty_store_is_deterministic() {
        let a = state_digest(&Store::default()).unwrap();
        let b = state_digest(&Store::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(state_digest_hex(&Store::default()).unwrap().len(), 64);
    }

    #[test]
    fn identical_histories_agree() {
        let run = || {
            let mut keeper = test_keeper(Decimal::new(25, 2));
            let id = keeper.create_auction(t0(), create_msg(100 * E18, t0())).unwrap();
            let alice = keeper.funded_buyer("alice", 100 * E18);
            keeper.buy(t0(), buy_msg(&alice, id, 10 * E18)).unwrap();
            keeper
        };
        let a = run();
        let b = run();
        let digest = state_digest(a.store()).unwrap();
        assert!(verify_state_digest(b.store(), &digest).unwrap());
    }

    #[test]
    fn any_state_change_changes_the_digest() {
        let mut keeper = test_keeper(Decimal::new(25, 2));
        let id = keeper.create_auction(t0(), create_msg(100 * E18, t0())).unwrap();
        let before = state_digest(keeper.store()).unwrap();

        let alice = keeper.funded_buyer("alice", 100 * E18);
        keeper.buy(t0(), buy_msg(&alice, id, 1)).unwrap_err();
        assert_eq!(state_digest(keeper.store()).unwrap(), before);

        keeper.buy(t0(), buy_msg(&alice, id, E18)).unwrap();
        assert_ne!(state_digest(keeper.store()).unwrap(), before);
    }
}
