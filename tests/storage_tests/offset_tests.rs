//! Tests for Offset arithmetic

use slotkv::storage::Offset;

#[test]
fn test_root_is_zero() {
    assert!(Offset::ROOT.is_root());
    assert_eq!(Offset::ROOT.as_u64(), 0);
    assert_eq!(Offset::default(), Offset::ROOT);
}

#[test]
fn test_next_and_prev_move_one_slot() {
    let pos = Offset::from_slot(3, 100);

    assert_eq!(pos.as_u64(), 300);
    assert_eq!(pos.next(100), Offset::new(400));
    assert_eq!(pos.prev(100), Some(Offset::new(200)));
}

#[test]
fn test_prev_of_root_is_none() {
    assert_eq!(Offset::ROOT.prev(100), None);
    assert_eq!(Offset::new(50).prev(100), None);
}

#[test]
fn test_alignment_and_slot_index() {
    assert!(Offset::new(300).is_aligned(100));
    assert!(!Offset::new(301).is_aligned(100));
    assert!(!Offset::new(0).is_aligned(0));
    assert_eq!(Offset::new(300).slot_index(100), 3);
}

#[test]
fn test_display_prints_byte_offset() {
    assert_eq!(Offset::new(65608).to_string(), "65608");
    assert_eq!(Offset::from(12u64), Offset::new(12));
}
