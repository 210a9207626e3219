use indoc::indoc;
use mdpool_format::Guid;

use crate::dump::{dump_blobs, dump_guids, dump_strings};
use crate::{BlobPool, GuidPool, StringPool};

#[test]
fn strings_listing() {
    let mut pool = StringPool::new();
    pool.insert("Foo").unwrap();
    pool.insert("Bar").unwrap();

    let out = dump_strings(&pool).unwrap();

    assert_eq!(
        out,
        indoc! {r#"
            [strings]
            0x0000  ""
            0x0001  "Foo"
            0x0005  "Bar"
            total = 9 bytes
        "#}
    );
}

#[test]
fn guids_listing() {
    let mut pool = GuidPool::new();
    pool.insert(Guid::from_bytes([0x11; 16])).unwrap();
    pool.insert(Guid::from_bytes([0x22; 16])).unwrap();

    let out = dump_guids(&pool).unwrap();

    assert_eq!(
        out,
        indoc! {"
            [guids]
               1  11111111-1111-1111-1111-111111111111
               2  22222222-2222-2222-2222-222222222222
            total = 32 bytes
        "}
    );
}

#[test]
fn blobs_listing() {
    let mut pool = BlobPool::new();
    pool.insert(&[0xDE, 0xAD]).unwrap();
    pool.insert(&[0x01]).unwrap();

    let out = dump_blobs(&pool).unwrap();

    assert_eq!(
        out,
        indoc! {"
            [blobs]
            0x0000  (0 bytes)
            0x0001  (2 bytes)  de ad
            0x0004  (1 bytes)  01
            total = 6 bytes
        "}
    );
}

#[test]
fn empty_heaps_list_only_totals() {
    let strings = StringPool::new();
    let guids = GuidPool::new();

    assert_eq!(
        dump_strings(&strings).unwrap(),
        indoc! {r#"
            [strings]
            0x0000  ""
            total = 1 bytes
        "#}
    );
    assert_eq!(
        dump_guids(&guids).unwrap(),
        indoc! {"
            [guids]
            total = 0 bytes
        "}
    );
}
