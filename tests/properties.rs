//! Round-trip and determinism properties of the URL and request encodings.

use proptest::prelude::*;
use tablesync::codec::{Codec, FiltersCodec, PageCodec, SortingCodec};
use tablesync::domain::{ColumnFilter, ColumnSort, FilterValue, PaginationState, TableState};
use tablesync::query::{build_query_params, QueryOptions, QueryParams};
use tablesync::sync::{SyncOptions, UrlKeys, UrlState, UrlSync};
use url::Url;

const COLUMNS: [&str; 4] = ["name", "email", "status", "age"];

fn sorting() -> impl Strategy<Value = Vec<ColumnSort>> {
    proptest::sample::subsequence(COLUMNS.to_vec(), 0..=COLUMNS.len())
        .prop_flat_map(|columns| {
            let n = columns.len();
            (Just(columns), proptest::collection::vec(any::<bool>(), n))
        })
        .prop_map(|(columns, desc)| {
            columns
                .into_iter()
                .zip(desc)
                .map(|(id, descending)| ColumnSort {
                    column_id: id.to_string(),
                    descending,
                })
                .collect()
        })
}

fn filter_value() -> impl Strategy<Value = FilterValue> {
    prop_oneof![
        "[a-z &=%]{1,8}".prop_map(FilterValue::Text),
        "[a-z]{1,6}".prop_map(FilterValue::Select),
        proptest::collection::vec("[a-z]{1,6}", 1..4).prop_map(FilterValue::MultiSelect),
        (-500i32..500, 0i32..500)
            .prop_map(|(lo, span)| FilterValue::Range(f64::from(lo), f64::from(lo + span))),
    ]
}

fn filters() -> impl Strategy<Value = Vec<ColumnFilter>> {
    proptest::sample::subsequence(COLUMNS.to_vec(), 0..=COLUMNS.len()).prop_flat_map(|columns| {
        let n = columns.len();
        (Just(columns), proptest::collection::vec(filter_value(), n)).prop_map(|(columns, values)| {
            columns
                .into_iter()
                .zip(values)
                .map(|(id, value)| ColumnFilter::new(id, value))
                .collect()
        })
    })
}

fn table_state() -> impl Strategy<Value = TableState> {
    (0usize..50, 1usize..100, sorting(), filters(), "[a-z ]{0,10}").prop_map(
        |(page_index, page_size, sorting, column_filters, global_filter)| TableState {
            pagination: PaginationState::new(page_index, page_size),
            sorting,
            column_filters,
            global_filter,
            ..TableState::default()
        },
    )
}

proptest! {
    #[test]
    fn page_numbers_round_trip(index in 0usize..1_000_000) {
        prop_assert_eq!(PageCodec.decode(&PageCodec.encode(&index)), Some(index));
    }

    #[test]
    fn sorting_round_trips(sorting in sorting()) {
        let codec = SortingCodec::new(COLUMNS);
        prop_assert_eq!(codec.decode(&codec.encode(&sorting)), Some(sorting));
    }

    #[test]
    fn filters_round_trip(filters in filters()) {
        let codec = FiltersCodec::new(COLUMNS);
        prop_assert_eq!(codec.decode(&codec.encode(&filters)), Some(filters));
    }

    #[test]
    fn url_write_then_read_is_identity(state in table_state()) {
        let options = SyncOptions { server_filtering: true, ..SyncOptions::default() };
        let sync = UrlSync::new(COLUMNS, UrlKeys::default(), options);
        let base = Url::parse("https://app.test/users?tab=all").unwrap();

        let slice = UrlState::from_table(&state, true);
        let url = sync.write_into(&base, &slice);
        prop_assert_eq!(sync.read(&url), slice.clone());
        prop_assert_eq!(sync.write_into(&url, &slice), url);
    }

    #[test]
    fn request_params_are_deterministic(state in table_state()) {
        let options = QueryOptions::default();
        let first = build_query_params(&state, &options);
        let second = build_query_params(&state.clone(), &options);
        prop_assert_eq!(first.to_query_string(), second.to_query_string());
        prop_assert_eq!(QueryParams::from_query_string(&first.to_query_string()), first);
    }
}
