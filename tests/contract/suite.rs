//! Backend-agnostic contract checks.
//!
//! Every function takes a fresh, empty database and panics on violation.

use crate::common::{data, TestData};
use regstore::{Db, Error, ErrorKind, TxExt};

const B1: &[u8] = b"B1";
const B2: &[u8] = b"B2";
const I1: &[u8] = b"I1";
const I2: &[u8] = b"I2";

fn setup<D: Db>(db: &D, buckets: &[&[u8]]) {
    db.update(|tx| {
        for bucket in buckets {
            tx.create_bucket_if_not_exists(bucket)?;
        }
        Ok(())
    })
    .unwrap();
}

// =============================================================================
// Buckets
// =============================================================================

pub fn test_create_bucket_is_idempotent<D: Db>(db: &D) {
    setup(db, &[B1]);
    db.update(|tx| tx.insert(B1, b"KeyA", &data(1))).unwrap();
    db.update(|tx| {
        tx.create_bucket_if_not_exists(B1)?;
        tx.create_bucket_if_not_exists(B1)
    })
    .unwrap();

    let got: TestData = db.view(|tx| tx.get(B1, b"KeyA")).unwrap();
    assert_eq!(got, data(1));
}

pub fn test_missing_bucket_is_generic<D: Db>(db: &D) {
    let errors: Vec<Error> = vec![
        db.update(|tx| tx.insert(B1, b"k", &data(1))).unwrap_err(),
        db.update(|tx| tx.update(B1, b"k", &data(1))).unwrap_err(),
        db.update(|tx| tx.add_index(I1, b"i", b"k")).unwrap_err(),
        db.update(|tx| tx.remove_key_from_index(I1, b"k")).unwrap_err(),
        db.update(|tx| tx.next_sequence_for_bucket(B1)).unwrap_err(),
        db.view(|tx| tx.get::<TestData>(B1, b"k")).unwrap_err(),
        db.view(|tx| tx.get_all::<TestData>(B1)).unwrap_err(),
        db.view(|tx| tx.index_entries(I1)).unwrap_err(),
    ];
    for err in errors {
        assert!(matches!(err, Error::BucketNotFound { .. }), "{err}");
        assert_eq!(err.kind(), ErrorKind::Generic);
    }
}

pub fn test_buckets_are_separate_namespaces<D: Db>(db: &D) {
    setup(db, &[B1, B2]);
    db.update(|tx| {
        tx.insert(B1, b"KeyA", &data(1))?;
        tx.insert(B2, b"KeyA", &data(2))
    })
    .unwrap();

    db.view(|tx| {
        assert_eq!(tx.get::<TestData>(B1, b"KeyA")?, data(1));
        assert_eq!(tx.get::<TestData>(B2, b"KeyA")?, data(2));
        Ok(())
    })
    .unwrap();
}

// =============================================================================
// Records
// =============================================================================

pub fn test_write_after_create<D: Db>(db: &D) {
    db.update(|tx| {
        tx.create_bucket_if_not_exists(B1)?;
        tx.insert(B1, b"KeyA", &data(42))
    })
    .unwrap();

    let got: TestData = db.view(|tx| tx.get(B1, b"KeyA")).unwrap();
    assert_eq!(got, data(42));
}

pub fn test_no_duplicate_insert<D: Db>(db: &D) {
    setup(db, &[B1]);
    db.update(|tx| tx.insert(B1, b"KeyA", &data(1))).unwrap();

    let err = db.update(|tx| tx.insert(B1, b"KeyA", &data(2))).unwrap_err();
    assert!(err.is_key_exists());
    assert_eq!(err.kind(), ErrorKind::KeyAlreadyExists);

    let got: TestData = db.view(|tx| tx.get(B1, b"KeyA")).unwrap();
    assert_eq!(got, data(1));
}

pub fn test_update_requires_existing_key<D: Db>(db: &D) {
    setup(db, &[B1]);
    let err = db.update(|tx| tx.update(B1, b"KeyA", &data(1))).unwrap_err();
    assert!(err.is_key_not_found());

    let err = db.view(|tx| tx.get::<TestData>(B1, b"KeyA")).unwrap_err();
    assert!(err.is_key_not_found());
}

pub fn test_update_is_visible<D: Db>(db: &D) {
    setup(db, &[B1]);
    db.update(|tx| tx.insert(B1, b"K", &data(1))).unwrap();
    db.update(|tx| tx.update(B1, b"K", &data(2))).unwrap();

    let got: TestData = db.view(|tx| tx.get(B1, b"K")).unwrap();
    assert_eq!(got, data(2));

    db.update(|tx| {
        tx.update(B1, b"K", &data(3))?;
        tx.update(B1, b"K", &data(4))
    })
    .unwrap();
    let all: Vec<TestData> = db.view(|tx| tx.get_all(B1)).unwrap();
    assert_eq!(all, vec![data(4)]);
}

pub fn test_writes_visible_inside_same_update<D: Db>(db: &D) {
    setup(db, &[B1]);
    let seen = db
        .update(|tx| {
            tx.insert(B1, b"K", &data(1))?;
            tx.update(B1, b"K", &data(2))?;
            tx.get::<TestData>(B1, b"K")
        })
        .unwrap();
    assert_eq!(seen, data(2));
}

pub fn test_ordered_enumeration<D: Db>(db: &D) {
    setup(db, &[B1]);
    db.update(|tx| {
        tx.insert(B1, b"KeyB", &data(2))?;
        tx.insert(B1, b"KeyA", &data(1))
    })
    .unwrap();

    let keys: Vec<Vec<u8>> = db
        .view(|tx| tx.get_all_bytes(B1))
        .unwrap()
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    assert_eq!(keys, vec![b"KeyA".to_vec(), b"KeyB".to_vec()]);
}

pub fn test_binary_keys_order_bytewise<D: Db>(db: &D) {
    setup(db, &[B1]);
    db.update(|tx| {
        tx.insert(B1, &[0xff], &data(3))?;
        tx.insert(B1, &[0x01, 0x00], &data(2))?;
        tx.insert(B1, &[0x00], &data(1))?;
        tx.insert(B1, &[0x01], &data(0))
    })
    .unwrap();

    let all: Vec<TestData> = db.view(|tx| tx.get_all(B1)).unwrap();
    assert_eq!(all, vec![data(1), data(0), data(2), data(3)]);
}

pub fn test_empty_bucket_enumerates_nothing<D: Db>(db: &D) {
    setup(db, &[B1, I1]);
    db.view(|tx| {
        assert!(tx.get_all::<TestData>(B1)?.is_empty());
        assert!(tx.get_all_by_index::<TestData>(I1, B1)?.is_empty());
        Ok(())
    })
    .unwrap();
}

pub fn test_end_to_end_scenario<D: Db>(db: &D) {
    db.update(|tx| tx.create_bucket_if_not_exists(B1)).unwrap();
    db.update(|tx| tx.insert(B1, b"KeyA", &data(5))).unwrap();
    db.update(|tx| tx.insert(B1, b"KeyB", &data(6))).unwrap();

    let all: Vec<TestData> = db.view(|tx| tx.get_all(B1)).unwrap();
    assert_eq!(all, vec![data(5), data(6)]);
}

pub fn test_decode_mismatch_is_generic<D: Db>(db: &D) {
    setup(db, &[B1]);
    db.update(|tx| tx.insert(B1, b"K", &7u8)).unwrap();

    let err = db.view(|tx| tx.get::<TestData>(B1, b"K")).unwrap_err();
    assert!(matches!(err, Error::Codec(_)), "{err}");
    assert!(err.is_generic());
}

// =============================================================================
// Indexes
// =============================================================================

pub fn test_index_uniqueness<D: Db>(db: &D) {
    setup(db, &[B1, I1]);
    db.update(|tx| {
        tx.insert(B1, b"K1", &data(1))?;
        tx.insert(B1, b"K2", &data(2))?;
        tx.add_index(I1, b"idx1", b"K1")
    })
    .unwrap();

    let err = db.update(|tx| tx.add_index(I1, b"idx1", b"K2")).unwrap_err();
    assert!(err.is_key_exists());

    let got: TestData = db.view(|tx| tx.get_by_index(I1, B1, b"idx1")).unwrap();
    assert_eq!(got, data(1));
}

pub fn test_get_all_by_index_follows_index_order<D: Db>(db: &D) {
    setup(db, &[B1, I1]);
    db.update(|tx| {
        tx.insert(B1, b"K1", &data(1))?;
        tx.insert(B1, b"K2", &data(2))?;
        tx.insert(B1, b"K3", &data(3))?;
        tx.add_index(I1, b"c", b"K1")?;
        tx.add_index(I1, b"a", b"K3")?;
        tx.add_index(I1, b"b", b"K2")
    })
    .unwrap();

    let all: Vec<TestData> = db.view(|tx| tx.get_all_by_index(I1, B1)).unwrap();
    assert_eq!(all, vec![data(3), data(2), data(1)]);
}

pub fn test_index_reads_latest_version<D: Db>(db: &D) {
    setup(db, &[B1, I1]);
    db.update(|tx| {
        tx.insert(B1, b"K1", &data(1))?;
        tx.add_index(I1, b"idx1", b"K1")
    })
    .unwrap();
    db.update(|tx| tx.update(B1, b"K1", &data(10))).unwrap();

    let got: TestData = db.view(|tx| tx.get_by_index(I1, B1, b"idx1")).unwrap();
    assert_eq!(got, data(10));
}

pub fn test_unmapped_index_key<D: Db>(db: &D) {
    setup(db, &[B1, I1]);
    let err = db
        .view(|tx| tx.get_by_index::<TestData>(I1, B1, b"nope"))
        .unwrap_err();
    assert!(err.is_key_not_found());
}

pub fn test_missing_index_target<D: Db>(db: &D) {
    setup(db, &[B1, I2]);
    db.update(|tx| tx.add_index(I2, b"IndexA", b"KeyA")).unwrap();

    let err = db
        .view(|tx| tx.get_by_index::<TestData>(I2, B1, b"IndexA"))
        .unwrap_err();
    assert!(err.is_key_not_found());
}

pub fn test_dangling_entry_fails_get_all_by_index<D: Db>(db: &D) {
    setup(db, &[B1, I1]);
    db.update(|tx| {
        tx.insert(B1, b"K1", &data(1))?;
        tx.add_index(I1, b"a", b"K1")?;
        tx.add_index(I1, b"b", b"gone")
    })
    .unwrap();

    let err = db
        .view(|tx| tx.get_all_by_index::<TestData>(I1, B1))
        .unwrap_err();
    assert!(err.is_key_not_found());
}

pub fn test_remove_key_from_index<D: Db>(db: &D) {
    setup(db, &[B1, I1]);
    db.update(|tx| {
        tx.insert(B1, b"K1", &data(1))?;
        tx.insert(B1, b"K2", &data(2))?;
        tx.add_index(I1, b"a", b"K1")?;
        tx.add_index(I1, b"b", b"K2")?;
        tx.add_index(I1, b"c", b"K1")
    })
    .unwrap();

    db.update(|tx| tx.remove_key_from_index(I1, b"K1")).unwrap();

    db.view(|tx| {
        assert_eq!(tx.index_entries(I1)?, vec![(b"b".to_vec(), b"K2".to_vec())]);
        assert!(tx.index_target(I1, b"a").unwrap_err().is_key_not_found());
        assert_eq!(tx.get::<TestData>(B1, b"K1")?, data(1));
        Ok(())
    })
    .unwrap();

    // A freed index key can be reused.
    db.update(|tx| tx.add_index(I1, b"a", b"K2")).unwrap();
    let got: TestData = db.view(|tx| tx.get_by_index(I1, B1, b"a")).unwrap();
    assert_eq!(got, data(2));

    // Removing an unknown target is not an error.
    db.update(|tx| tx.remove_key_from_index(I1, b"nobody")).unwrap();
}

pub fn test_index_and_records_share_bucket<D: Db>(db: &D) {
    setup(db, &[B1]);
    db.update(|tx| {
        tx.insert(B1, b"KeyA", &data(1))?;
        tx.add_index(B1, b"KeyA", b"KeyA")
    })
    .unwrap();

    db.view(|tx| {
        assert_eq!(tx.get_all::<TestData>(B1)?, vec![data(1)]);
        assert_eq!(tx.get_by_index::<TestData>(B1, B1, b"KeyA")?, data(1));
        Ok(())
    })
    .unwrap();
}

// =============================================================================
// Sequences
// =============================================================================

pub fn test_sequence_independence<D: Db>(db: &D) {
    setup(db, &[B1, B2]);
    let mut b1 = Vec::new();
    let mut b2 = Vec::new();
    for _ in 0..3 {
        b1.push(db.update(|tx| tx.next_sequence_for_bucket(B1)).unwrap());
        b2.push(db.update(|tx| tx.next_sequence_for_bucket(B2)).unwrap());
    }
    assert_eq!(b1, vec![1, 2, 3]);
    assert_eq!(b2, vec![1, 2, 3]);
}

pub fn test_sequence_ignores_record_versions<D: Db>(db: &D) {
    setup(db, &[B1]);
    db.update(|tx| {
        tx.insert(B1, b"K", &data(1))?;
        tx.update(B1, b"K", &data(2))?;
        tx.update(B1, b"K", &data(3))
    })
    .unwrap();

    let n = db.update(|tx| tx.next_sequence_for_bucket(B1)).unwrap();
    assert_eq!(n, 1);
}

pub fn test_sequence_within_one_update<D: Db>(db: &D) {
    setup(db, &[B1]);
    let ids = db
        .update(|tx| {
            let a = tx.next_sequence_for_bucket(B1)?;
            let b = tx.next_sequence_for_bucket(B1)?;
            Ok((a, b))
        })
        .unwrap();
    assert_eq!(ids, (1, 2));
}

// =============================================================================
// Transactions
// =============================================================================

pub fn test_view_rejects_mutations<D: Db>(db: &D) {
    setup(db, &[B1, I1]);
    db.update(|tx| {
        tx.insert(B1, b"K", &data(1))?;
        tx.add_index(I1, b"idx", b"K")
    })
    .unwrap();

    db.view(|tx| {
        assert!(!tx.is_writable());
        let rejected = [
            tx.create_bucket_if_not_exists(B2).unwrap_err(),
            tx.insert(B1, b"K2", &data(2)).unwrap_err(),
            tx.update(B1, b"K", &data(3)).unwrap_err(),
            tx.add_index(I1, b"idx2", b"K").unwrap_err(),
            tx.remove_key_from_index(I1, b"K").unwrap_err(),
            tx.next_sequence_for_bucket(B1).unwrap_err(),
        ];
        for err in rejected {
            assert!(err.is_not_writable(), "{err}");
        }
        Ok(())
    })
    .unwrap();

    db.view(|tx| {
        assert_eq!(tx.get_all::<TestData>(B1)?, vec![data(1)]);
        assert_eq!(tx.index_entries(I1)?.len(), 1);
        Ok(())
    })
    .unwrap();
    let n = db.update(|tx| tx.next_sequence_for_bucket(B1)).unwrap();
    assert_eq!(n, 1);
    let err = db.update(|tx| tx.insert(B2, b"K", &data(1))).unwrap_err();
    assert!(matches!(err, Error::BucketNotFound { .. }));
}

pub fn test_view_rejects_before_bucket_check<D: Db>(db: &D) {
    let err = db.view(|tx| tx.insert(B1, b"K", &data(1))).unwrap_err();
    assert!(err.is_not_writable());
}

pub fn test_update_is_writable<D: Db>(db: &D) {
    let writable = db.update(|tx| Ok(tx.is_writable())).unwrap();
    assert!(writable);
}

pub fn test_rollback_on_error<D: Db>(db: &D) {
    setup(db, &[B1, I1]);
    db.update(|tx| tx.insert(B1, b"Kept", &data(0))).unwrap();

    let err = db
        .update(|tx| {
            tx.create_bucket_if_not_exists(B2)?;
            tx.insert(B1, b"K", &data(1))?;
            tx.update(B1, b"Kept", &data(99))?;
            tx.add_index(I1, b"idx", b"K")?;
            tx.next_sequence_for_bucket(B1)?;
            tx.insert(B1, b"K", &data(2))
        })
        .unwrap_err();
    assert!(err.is_key_exists());

    db.view(|tx| {
        assert_eq!(tx.get_all::<TestData>(B1)?, vec![data(0)]);
        assert!(tx.index_entries(I1)?.is_empty());
        assert!(tx.get_all::<TestData>(B2).is_err());
        Ok(())
    })
    .unwrap();
    let n = db.update(|tx| tx.next_sequence_for_bucket(B1)).unwrap();
    assert_eq!(n, 1);
}

pub fn test_closure_error_is_returned_unchanged<D: Db>(db: &D) {
    let err = db
        .update(|_tx| Err::<(), _>(Error::Config("caller".into())))
        .unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg == "caller"));

    let err = db
        .view(|_tx| Err::<(), _>(Error::key_not_found(b"x", b"y")))
        .unwrap_err();
    assert!(err.is_key_not_found());
}
