//! Forward replay of ledger deltas into running totals.
//!
//! After any insert, delta update, or delete, every entry from the mutation
//! point onward must have its cached `running_total` recomputed. The
//! persistence layer fetches the affected suffix of the ledger in id order
//! and feeds the deltas through these functions; the cost of a write is
//! therefore proportional to the number of entries after the mutated
//! position, not to total history length.

use super::types::LedgerValue;

/// Computes the running total after each delta, starting from `total_before`.
///
/// `total_before` is the prefix sum of all surviving entries strictly before
/// the first delta (zero when replaying from the start of the ledger). The
/// returned vector is parallel to `deltas`: element `i` is the correct
/// `running_total` for the entry carrying `deltas[i]`.
#[must_use]
pub fn running_totals<V: LedgerValue>(total_before: V, deltas: &[V]) -> Vec<V> {
    let mut totals = Vec::with_capacity(deltas.len());
    let mut current = total_before;
    for delta in deltas {
        current = current.accumulate(*delta);
        totals.push(current);
    }
    totals
}

/// Replays a whole ledger from its beginning.
#[must_use]
pub fn replay<V: LedgerValue>(deltas: &[V]) -> Vec<V> {
    running_totals(V::ZERO, deltas)
}

/// The customer's denormalized total after a replayed suffix.
///
/// The last replayed total wins; if the suffix is empty the total falls back
/// to `total_before` (which is itself zero for an empty ledger).
#[must_use]
pub fn final_total<V: LedgerValue>(total_before: V, suffix_totals: &[V]) -> V {
    suffix_totals.last().copied().unwrap_or(total_before)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// Strategy for generating 2-decimal deltas, positive or negative.
    fn delta_strategy() -> impl Strategy<Value = Decimal> {
        (-100_000i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn deltas_strategy(max_len: usize) -> impl Strategy<Value = Vec<Decimal>> {
        prop::collection::vec(delta_strategy(), 0..=max_len)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// For 2-decimal deltas the per-step rounding is exact, so every
        /// running total equals the plain prefix sum up to that entry.
        #[test]
        fn prop_running_total_is_prefix_sum(deltas in deltas_strategy(30)) {
            let totals = replay(&deltas);
            prop_assert_eq!(totals.len(), deltas.len());

            let mut prefix = Decimal::ZERO;
            for (i, delta) in deltas.iter().enumerate() {
                prefix += delta;
                prop_assert_eq!(totals[i], prefix, "entry {} diverged from prefix sum", i);
            }
        }

        /// Re-running the replay over unchanged deltas changes nothing.
        #[test]
        fn prop_replay_is_idempotent(deltas in deltas_strategy(30)) {
            let first = replay(&deltas);
            let second = replay(&deltas);
            prop_assert_eq!(first, second);
        }

        /// Replaying a suffix seeded with the prefix total matches a full
        /// replay: the cascade may start at any anchor without changing the
        /// outcome.
        #[test]
        fn prop_suffix_replay_matches_full_replay(
            deltas in deltas_strategy(30),
            split in 0usize..31,
        ) {
            let split = split.min(deltas.len());
            let full = replay(&deltas);

            let total_before = if split == 0 {
                Decimal::ZERO
            } else {
                full[split - 1]
            };
            let suffix = running_totals(total_before, &deltas[split..]);

            prop_assert_eq!(&full[split..], &suffix[..]);
            prop_assert_eq!(
                final_total(total_before, &suffix),
                final_total(Decimal::ZERO, &full)
            );
        }

        /// Deleting one delta and replaying the suffix after it yields the
        /// same totals as a full replay of the surviving deltas.
        #[test]
        fn prop_delete_cascade_matches_full_replay(
            deltas in deltas_strategy(30),
            victim in 0usize..30,
        ) {
            prop_assume!(!deltas.is_empty());
            let victim = victim.min(deltas.len() - 1);

            let mut survivors = deltas.clone();
            survivors.remove(victim);
            let expected = replay(&survivors);

            // The deleted row is excluded from its own prefix; all
            // strictly-earlier rows are included.
            let total_before: Decimal = deltas[..victim].iter().copied().sum();
            let suffix = running_totals(total_before, &deltas[victim + 1..]);

            prop_assert_eq!(&expected[victim..], &suffix[..]);
        }

        /// Credit ledgers replay the same way with plain integer addition.
        #[test]
        fn prop_credit_replay_is_prefix_sum(
            deltas in prop::collection::vec(-10_000i64..10_000i64, 0..30),
        ) {
            let totals = replay(&deltas);
            let mut prefix = 0i64;
            for (i, delta) in deltas.iter().enumerate() {
                prefix += delta;
                prop_assert_eq!(totals[i], prefix);
            }
        }
    }

    #[test]
    fn test_per_step_rounding_result() {
        let totals = replay(&[dec!(10.00), dec!(-3.00), dec!(0.01)]);
        assert_eq!(totals, vec![dec!(10.00), dec!(7.00), dec!(7.01)]);
    }

    #[test]
    fn test_record_then_spend() {
        let totals = replay(&[dec!(100.00), dec!(-40.00)]);
        assert_eq!(totals, vec![dec!(100.00), dec!(60.00)]);
        assert_eq!(final_total(Decimal::ZERO, &totals), dec!(60.00));
    }

    #[test]
    fn test_mid_sequence_delete() {
        // e1(+100.00), e2(-40.00), e3(+10.00); delete e2.
        let total_before = dec!(100.00); // e1 keeps its total
        let suffix = running_totals(total_before, &[dec!(10.00)]);
        assert_eq!(suffix, vec![dec!(110.00)]);
        assert_eq!(final_total(total_before, &suffix), dec!(110.00));
    }

    #[test]
    fn test_delete_last_entry_falls_back_to_prefix() {
        let suffix: Vec<Decimal> = running_totals(dec!(60.00), &[]);
        assert!(suffix.is_empty());
        assert_eq!(final_total(dec!(60.00), &suffix), dec!(60.00));
    }

    #[test]
    fn test_empty_ledger_total_is_zero() {
        let totals: Vec<Decimal> = replay(&[]);
        assert_eq!(final_total(Decimal::ZERO, &totals), Decimal::ZERO);
    }

    #[test]
    fn test_credits_allow_negative_totals() {
        // No overdraft prevention: spending past zero goes negative.
        let totals = replay(&[7i64, 2, -9, -1]);
        assert_eq!(totals, vec![7, 9, 0, -1]);
    }
}
