use mdpool_format::Offset;

use crate::read::HeapRead;
use crate::write::HeapConfig;
use crate::{BlobPool, PoolError};

#[test]
fn duplicate_inserts_share_one_entry() {
    let mut pool = BlobPool::new();

    let a = pool.insert(&[1, 2, 3]).unwrap();
    let b = pool.insert(&[4, 5]).unwrap();
    let again = pool.insert(&[1, 2, 3]).unwrap();

    assert_eq!(a, Offset(1));
    assert_eq!(b, Offset(5));
    assert_eq!(again, a);
    assert_eq!(pool.entry_count(), 2);
}

#[test]
fn empty_blob_is_the_reserved_offset() {
    let mut pool = BlobPool::new();
    pool.insert(&[1]).unwrap();

    assert_eq!(pool.insert(&[]).unwrap(), Offset::NIL);
    assert_eq!(pool.get(Offset::NIL).unwrap(), &[] as &[u8]);
    assert_eq!(pool.entry_count(), 1);
}

#[test]
fn get_returns_what_insert_stored() {
    let mut pool = BlobPool::new();
    let payload: Vec<u8> = (0..=255).collect();

    let offset = pool.insert(&payload).unwrap();

    assert_eq!(pool.get(offset).unwrap(), payload);
}

#[test]
fn large_payload_uses_a_wider_prefix() {
    let mut pool = BlobPool::new();
    let small = pool.insert(&[9]).unwrap();
    let large_payload = vec![7u8; 0x200];

    let large = pool.insert(&large_payload).unwrap();

    // Sentinel (1) + small entry (1 prefix + 1 payload) puts the large
    // entry at 3; its 0x200-byte payload needs a 2-byte prefix.
    assert_eq!(small, Offset(1));
    assert_eq!(large, Offset(3));
    assert_eq!(pool.get(large).unwrap(), large_payload);
    let next = pool.insert(&[8]).unwrap();
    assert_eq!(next, Offset(3 + 2 + 0x200));
}

#[test]
fn find_does_not_insert() {
    let mut pool = BlobPool::new();
    let a = pool.insert(&[1, 2]).unwrap();

    assert_eq!(pool.find(&[1, 2]), Some(a));
    assert_eq!(pool.find(&[]), Some(Offset::NIL));
    assert_eq!(pool.find(&[9, 9]), None);
    assert_eq!(pool.entry_count(), 1);
}

#[test]
fn payloads_with_shared_prefixes_stay_distinct() {
    let mut pool = BlobPool::new();

    let ab = pool.insert(&[0xA, 0xB]).unwrap();
    let abc = pool.insert(&[0xA, 0xB, 0xC]).unwrap();

    assert_ne!(ab, abc);
    assert_eq!(pool.get(ab).unwrap(), &[0xA, 0xB]);
    assert_eq!(pool.get(abc).unwrap(), &[0xA, 0xB, 0xC]);
}

#[test]
fn offsets_survive_repeated_growth() {
    let mut pool = BlobPool::with_config(HeapConfig {
        increment: 1,
        ..HeapConfig::default()
    });

    let mut entries = Vec::new();
    for i in 0..150u32 {
        let payload = i.to_le_bytes().repeat(3);
        entries.push((pool.insert(&payload).unwrap(), payload));
    }

    for (offset, payload) in &entries {
        assert_eq!(pool.get(*offset).unwrap(), payload);
        assert_eq!(pool.find(payload), Some(*offset));
    }
    assert_eq!(pool.entry_count(), 150);
}

#[test]
fn open_resumes_an_existing_heap() {
    let mut first = BlobPool::new();
    let a = first.insert(&[1, 2, 3]).unwrap();
    first.insert(&[4]).unwrap();
    let mut bytes = Vec::new();
    first.persist_to(&mut bytes).unwrap();

    let mut pool = BlobPool::open(bytes).unwrap();

    assert_eq!(pool.insert(&[1, 2, 3]).unwrap(), a);
    assert_eq!(pool.get(a).unwrap(), &[1, 2, 3]);
    assert_eq!(pool.entry_count(), 2);
}

#[test]
fn frozen_pool_rejects_all_inserts() {
    let mut pool = BlobPool::new();
    let kept = pool.insert(&[5]).unwrap();

    pool.freeze();

    assert!(matches!(pool.insert(&[6]), Err(PoolError::Frozen)));
    assert!(matches!(pool.insert(&[5]), Err(PoolError::Frozen)));
    assert!(matches!(pool.insert(&[]), Err(PoolError::Frozen)));

    assert_eq!(pool.get(kept).unwrap(), &[5]);
}

#[test]
fn into_read_resolves_the_same_offsets() {
    let mut pool = BlobPool::new();
    let a = pool.insert(&[1, 2, 3]).unwrap();

    let read = pool.into_read();

    assert_eq!(read.get_blob(a).unwrap(), &[1, 2, 3]);
    assert_eq!(read.get_blob(Offset::NIL).unwrap(), &[] as &[u8]);
}
