//! Property tests for root-hash determinism and fork isolation.

use ledgermint_state::LedgerView;
use ledgermint_types::{Address, U256};
use proptest::prelude::*;

fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from)
}

fn arb_grants() -> impl Strategy<Value = Vec<(Address, u64)>> {
    prop::collection::vec((arb_address(), 1u64..=u64::MAX / 2), 0..16)
}

/// A grant list together with a shuffled copy of itself.
fn arb_grants_with_reordering(
) -> impl Strategy<Value = (Vec<(Address, u64)>, Vec<(Address, u64)>)> {
    arb_grants().prop_flat_map(|grants| {
        let shuffled = Just(grants.clone()).prop_shuffle();
        (Just(grants), shuffled)
    })
}

proptest! {
    /// Applying the same grants in any order yields the same root hash.
    #[test]
    fn root_hash_is_order_independent((grants, shuffled) in arb_grants_with_reordering()) {
        let mut forward = LedgerView::new();
        for (address, amount) in &grants {
            forward.credit(*address, U256::from(*amount));
        }

        let mut reordered = LedgerView::new();
        for (address, amount) in &shuffled {
            reordered.credit(*address, U256::from(*amount));
        }

        prop_assert_eq!(forward.root_hash(), reordered.root_hash());
    }

    /// Mutating a fork never changes the source view's root hash.
    #[test]
    fn fork_mutation_never_leaks_into_source(
        grants in arb_grants(),
        extra in arb_address(),
        amount in 1u64..=1_000_000,
    ) {
        let mut source = LedgerView::new();
        for (address, value) in &grants {
            source.credit(*address, U256::from(*value));
        }
        let source_root = source.root_hash();

        let mut fork = source.fork();
        fork.credit(extra, U256::from(amount));
        fork.set_nonce(extra, 1);

        prop_assert_eq!(source.root_hash(), source_root);
    }
}
