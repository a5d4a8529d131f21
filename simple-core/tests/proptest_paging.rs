use proptest::prelude::*;
use simple_core::Paging;

proptest! {
    /// Property: a positive page and limit always yield (page - 1) * limit
    #[test]
    fn prop_offset_for_positive_inputs(page in 1i64..100_000, limit in 1i64..10_000) {
        let paging = Paging::new(page, limit);
        prop_assert_eq!(paging.offset(), Some((page - 1) * limit));
        prop_assert_eq!(paging.limit(), Some(limit));
    }

    /// Property: any non-positive input removes the offset
    #[test]
    fn prop_non_positive_disables_offset(page in -1000i64..=0, limit in -1000i64..1000) {
        prop_assert_eq!(Paging::new(page, limit).offset(), None);
        prop_assert_eq!(Paging::new(limit.abs() + 1, -limit.abs()).offset(), None);
    }

    /// Property: limit-only paging never skips rows
    #[test]
    fn prop_limit_only_never_skips(limit in -1000i64..1000) {
        prop_assert_eq!(Paging::limit_only(limit).skip(), None);
    }

    /// Property: the offset is defined and non-negative over the whole i64 range
    #[test]
    fn prop_offset_never_overflows(page in any::<i64>(), limit in any::<i64>()) {
        let offset = Paging::new(page, limit).offset();
        prop_assert!(offset.map_or(true, |o| o >= 0));
    }
}
