//! Property-based tests for the approval state machine.
//!
//! Tests for:
//! - Structural invariant: a level sits in exactly one of {requested,
//!   provided} at every observable point
//! - Stamp monotonicity across grant/retract/grant cycles
//! - Invalidation-watermark filtering

use super::store::InvalidationLedger;
use super::types::ApprovalSet;
use crate::types::{AccountName, PermissionLevel, Timestamp};
use proptest::prelude::*;

fn level(actor: u8, permission: u8) -> PermissionLevel {
    PermissionLevel::new(format!("actor{}", actor), format!("perm{}", permission))
}

fn all_levels() -> Vec<PermissionLevel> {
    (0..6u8)
        .flat_map(|actor| (0..3u8).map(move |permission| level(actor, permission)))
        .collect()
}

proptest! {
    /// Under any interleaving of grant/retract attempts, every level stays
    /// in exactly one state and the two views partition the set.
    #[test]
    fn level_is_never_in_both_views(
        ops in prop::collection::vec((0u8..6, 0u8..3, any::<bool>()), 0..64),
    ) {
        let levels = all_levels();
        let mut set = ApprovalSet::request_all(levels.clone());
        let mut clock = 0u64;

        for (actor, permission, is_grant) in ops {
            let target = level(actor, permission);
            clock += 1;
            let stamp = Timestamp::from_micros(clock);
            if is_grant {
                let _ = set.grant(&target, stamp);
            } else {
                let _ = set.retract(&target, stamp);
            }

            let requested: Vec<_> = set.requested().map(|(l, _)| l.clone()).collect();
            let provided: Vec<_> = set.provided().map(|(l, _)| l.clone()).collect();
            prop_assert_eq!(requested.len() + provided.len(), levels.len());
            for l in &requested {
                prop_assert!(!provided.contains(l));
            }
        }
    }

    /// grant -> retract -> grant leaves the level provided, stamped with the
    /// latest transition time, strictly later than the first grant.
    #[test]
    fn regrant_stamp_is_strictly_later(
        first in 1u64..1_000_000,
        gap1 in 1u64..1_000,
        gap2 in 1u64..1_000,
    ) {
        let target = level(0, 0);
        let mut set = ApprovalSet::request_all([target.clone()]);

        set.grant(&target, Timestamp::from_micros(first)).unwrap();
        set.retract(&target, Timestamp::from_micros(first + gap1)).unwrap();
        set.grant(&target, Timestamp::from_micros(first + gap1 + gap2)).unwrap();

        let (granted, stamp) = set.provided().next().unwrap();
        prop_assert_eq!(granted, &target);
        prop_assert_eq!(stamp, Timestamp::from_micros(first + gap1 + gap2));
        prop_assert!(stamp > Timestamp::from_micros(first));
    }

    /// An approval is effective iff its stamp is strictly after the actor's
    /// watermark; actors without a watermark are always effective.
    #[test]
    fn watermark_filter_boundary(
        watermark in 0u64..1_000,
        stamp in 0u64..1_000,
    ) {
        let alice = AccountName::new("alice");
        let bob = AccountName::new("bob");
        let mut ledger = InvalidationLedger::new();
        ledger.invalidate(&alice, Timestamp::from_micros(watermark));

        prop_assert_eq!(
            ledger.is_effective(&alice, Timestamp::from_micros(stamp)),
            watermark < stamp
        );
        prop_assert!(ledger.is_effective(&bob, Timestamp::from_micros(stamp)));
    }

    /// Re-invalidation only ever advances the observable watermark to the
    /// latest call, and the latest call wins regardless of order of values.
    #[test]
    fn reinvalidation_overwrites(
        first in 0u64..1_000,
        second in 0u64..1_000,
    ) {
        let alice = AccountName::new("alice");
        let mut ledger = InvalidationLedger::new();

        ledger.invalidate(&alice, Timestamp::from_micros(first));
        ledger.invalidate(&alice, Timestamp::from_micros(second));

        prop_assert_eq!(ledger.watermark(&alice), Some(Timestamp::from_micros(second)));
        prop_assert_eq!(ledger.len(), 1);
    }
}
