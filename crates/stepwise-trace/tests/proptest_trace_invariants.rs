//! Property-based invariant tests for positions and trace identity.
//!
//! 1. Clamping always lands in `[-1, len - 1]`
//! 2. Positions survive the signed wire encoding
//! 3. Forward and backward stepping stay in bounds and invert each other
//! 4. Trace ids depend on content only

use proptest::prelude::*;
use stepwise_trace::{Position, Step, StepKind, Trace};

fn kind_strategy() -> impl Strategy<Value = StepKind> {
    prop_oneof![
        (0usize..16, 0usize..16).prop_map(|(i, j)| StepKind::Compare { i, j }),
        (0usize..16, 0usize..16).prop_map(|(i, j)| StepKind::Swap { i, j }),
        (0usize..16).prop_map(|index| StepKind::Select { index }),
        (0usize..16).prop_map(|node| StepKind::Visit { node }),
        Just(StepKind::NotFound),
    ]
}

proptest! {
    #[test]
    fn clamped_is_in_bounds(target in any::<i64>(), len in 0usize..1_000) {
        let p = Position::clamped(target, len);
        let signed = i64::from(p);
        prop_assert!(signed >= -1);
        prop_assert!(signed < len as i64 || (len == 0 && signed == -1));
        if (0..len as i64).contains(&target) {
            prop_assert_eq!(signed, target);
        }
    }

    #[test]
    fn wire_encoding_round_trips(raw in -1i64..100_000) {
        let p = Position::from(raw);
        let json = serde_json::to_string(&p).unwrap();
        prop_assert_eq!(&json, &raw.to_string());
        let back: Position = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, p);
    }

    #[test]
    fn stepping_stays_in_bounds(len in 0usize..50, walk in prop::collection::vec(any::<bool>(), 0..120)) {
        let mut p = Position::BEFORE_START;
        for forward in walk {
            let moved = if forward { p.next_within(len) } else { p.prev() };
            if let Some(next) = moved {
                let back = if forward { next.prev() } else { next.next_within(len) };
                prop_assert_eq!(back, Some(p));
                p = next;
            }
            prop_assert!(p <= Position::last(len));
        }
    }

    #[test]
    fn trace_id_is_content_addressed(kinds in prop::collection::vec(kind_strategy(), 0..30)) {
        let steps: Vec<Step> = kinds.iter().cloned().map(Step::new).collect();
        let a = Trace::new(steps.clone());
        let b = Trace::new(steps);
        prop_assert_eq!(a.id(), b.id());

        let mut extended = kinds;
        extended.push(StepKind::NotFound);
        let c = Trace::new(extended.into_iter().map(Step::new).collect());
        prop_assert_ne!(a.id(), c.id());
    }
}
