use crate::edit::{Edit, EditError, EditMap};

#[test]
fn replace_shifts_everything_after() {
    let map = EditMap::from_edits(10, &[Edit::replace(2..4, 5)]).unwrap();
    assert_eq!(map.new_len(), 13);
    assert_eq!(map.to_old(0), Some(0));
    assert_eq!(map.to_old(1), Some(1));
    assert_eq!(map.to_old(2), None);
    assert_eq!(map.to_old(6), None);
    assert_eq!(map.to_old(7), Some(4));
    assert_eq!(map.to_old(13), Some(10));
}

#[test]
fn insertion_and_deletion() {
    let map = EditMap::from_edits(6, &[Edit::insert(3, 2)]).unwrap();
    assert_eq!(map.to_old(2), Some(2));
    assert_eq!(map.to_old(3), None);
    assert_eq!(map.to_old(5), Some(3));

    let map = EditMap::from_edits(6, &[Edit::delete(1..3)]).unwrap();
    assert_eq!(map.new_len(), 4);
    assert_eq!(map.to_old(1), Some(3));
}

#[test]
fn later_edits_use_earlier_coordinates() {
    // "abcdef" -> "aXYcdef" -> "aXYcdZ"
    let edits = [Edit::replace(1..2, 2), Edit::replace(5..7, 1)];
    let map = EditMap::from_edits(6, &edits).unwrap();
    assert_eq!(map.new_len(), 6);
    assert_eq!(map.to_old(3), Some(2));
    assert_eq!(map.to_old(4), Some(3));
    assert_eq!(map.to_old(5), None);

    let mut text = b"abcdef".to_vec();
    edits[0].apply(&mut text, b"XY");
    edits[1].apply(&mut text, b"Z");
    assert_eq!(text, b"aXYcdZ");
}

#[test]
fn touching_edits_merge() {
    let edits = [Edit::replace(2..3, 1), Edit::insert(3, 1)];
    let map = EditMap::from_edits(5, &edits).unwrap();
    assert_eq!(map.new_len(), 6);
    assert_eq!(map.to_old(2), None);
    assert_eq!(map.to_old(3), None);
    assert_eq!(map.to_old(4), Some(3));
    assert!(map.damages(2, 3));
    assert!(!map.damages(3, 5));
}

#[test]
fn damage_respects_lookahead() {
    let map = EditMap::from_edits(10, &[Edit::replace(4..5, 1)]).unwrap();

    // Ends right where the edit starts and never looked further.
    assert!(!map.damages(2, 4));
    // Looked at the edited byte while lexing.
    assert!(map.damages(2, 5));
    // Starts right after the edit.
    assert!(!map.damages(5, 8));

    let insert = EditMap::from_edits(10, &[Edit::insert(4, 3)]).unwrap();
    assert!(insert.damages(2, 6));
    assert!(!insert.damages(4, 6));
    assert!(!insert.damages(1, 4));
}

#[test]
fn empty_map() {
    let map = EditMap::from_edits(4, &[]).unwrap();
    assert!(map.is_empty());
    assert_eq!(map.old_len(), 4);
    assert_eq!(map.to_old(3), Some(3));
    assert!(!map.damages(0, 5));
}

#[test]
fn malformed_edits() {
    let inverted = Edit {
        start_byte: 3,
        old_end_byte: 2,
        new_end_byte: 3,
    };
    assert_eq!(
        EditMap::from_edits(5, &[inverted]).unwrap_err(),
        EditError::Inverted {
            index: 0,
            start: 3,
            end: 2
        }
    );

    let err = EditMap::from_edits(5, &[Edit::insert(0, 1), Edit::delete(4..7)]).unwrap_err();
    insta::assert_snapshot!(err, @"edit 1 reaches byte 7, past the text length 6");
}

#[test]
fn delta() {
    assert_eq!(Edit::replace(2..5, 1).delta(), -2);
    assert_eq!(Edit::insert(0, 3).delta(), 3);
}
