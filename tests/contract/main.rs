//! Storage Contract Test Suite
//!
//! One battery of checks, run unchanged against every backend. A caller must
//! not be able to tell the backends apart through the contract.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run the whole suite
//! cargo test --test contract
//!
//! # Run one backend only
//! cargo test --test contract memory::
//! ```

#[path = "../common/mod.rs"]
mod common;
mod suite;

/// Instantiate every listed suite check as a `#[test]` for one backend.
macro_rules! contract_tests {
    ($backend:ident, $fixture:path, [$($case:ident),* $(,)?]) => {
        mod $backend {
            $(
                #[test]
                fn $case() {
                    crate::common::init_tracing();
                    let fixture = $fixture();
                    crate::suite::$case(&fixture.db);
                }
            )*
        }
    };
}

macro_rules! all_contract_tests {
    ($backend:ident, $fixture:path) => {
        contract_tests!($backend, $fixture, [
            test_create_bucket_is_idempotent,
            test_missing_bucket_is_generic,
            test_buckets_are_separate_namespaces,
            test_write_after_create,
            test_no_duplicate_insert,
            test_update_requires_existing_key,
            test_update_is_visible,
            test_writes_visible_inside_same_update,
            test_ordered_enumeration,
            test_binary_keys_order_bytewise,
            test_empty_bucket_enumerates_nothing,
            test_end_to_end_scenario,
            test_decode_mismatch_is_generic,
            test_index_uniqueness,
            test_get_all_by_index_follows_index_order,
            test_index_reads_latest_version,
            test_unmapped_index_key,
            test_missing_index_target,
            test_dangling_entry_fails_get_all_by_index,
            test_remove_key_from_index,
            test_index_and_records_share_bucket,
            test_sequence_independence,
            test_sequence_ignores_record_versions,
            test_sequence_within_one_update,
            test_view_rejects_mutations,
            test_view_rejects_before_bucket_check,
            test_update_is_writable,
            test_rollback_on_error,
            test_closure_error_is_returned_unchanged,
        ]);
    };
}

all_contract_tests!(memory, crate::common::memory);
all_contract_tests!(durable, crate::common::durable);
all_contract_tests!(ephemeral, crate::common::ephemeral);
