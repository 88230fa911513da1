mod common;

use std::cell::Cell;

use kivi_mem::{CapacityError, DynamicArray, Fixed};

use common::{Probe, live, constructed, dropped, fail_after, values, expect_panic};

fn probes(values: &[i32]) -> DynamicArray<Probe> {
    values.iter().map(|&v| Probe::new(v)).collect()
}

#[test]
fn failing_reallocating_emplace_back_changes_nothing() {
    let mut array = probes(&[1, 2, 3, 4]);
    assert_eq!(array.len(), array.capacity());
    let capacity = array.capacity();
    let before = live();
    fail_after(1);
    expect_panic(|| array.emplace_back(|| Probe::new(5)).map(|_| ()));
    assert_eq!(array.len(), 4);
    assert_eq!(array.capacity(), capacity);
    assert_eq!(values(&array), [1, 2, 3, 4]);
    assert_eq!(live(), before);
}

#[test]
fn failing_reallocating_insert_in_middle_changes_nothing() {
    let mut array = probes(&[1, 2]);
    let ptr = array.as_ptr();
    let source = Probe::new(9);
    fail_after(1);
    expect_panic(|| array.emplace(1, || source.clone()).map(|_| ()));
    assert_eq!(array.as_ptr(), ptr);
    assert_eq!(array.capacity(), 2);
    assert_eq!(values(&array), [1, 2]);
}

#[test]
fn failing_construction_without_realloc_changes_nothing() {
    let mut array = probes(&[1, 2, 3]);
    array.reserve(8).unwrap();
    let before = live();
    fail_after(1);
    expect_panic(|| array.emplace(1, || Probe::new(7)).map(|_| ()));
    assert_eq!(values(&array), [1, 2, 3]);
    assert_eq!(array.capacity(), 8);
    assert_eq!(live(), before);
}

#[test]
fn refused_reserve_leaves_array_exactly_as_before() {
    let mut array = probes(&[1, 2, 3]);
    let (ptr, built, before) = (array.as_ptr(), constructed(), live());
    for requested in [usize::MAX, usize::MAX / 2] {
        assert_eq!(array.reserve(requested), Err(CapacityError::CapacityOverflow { requested }));
        assert_eq!(array.len(), 3);
        assert_eq!(array.capacity(), 3);
        assert_eq!(array.as_ptr(), ptr);
    }
    assert_eq!(values(&array), [1, 2, 3]);
    assert_eq!((constructed(), live()), (built, before));
}

#[test]
fn refused_growth_leaves_array_exactly_as_before() {
    let mut array: DynamicArray<Probe, Fixed> = DynamicArray::with_capacity(2).unwrap();
    array.push(Probe::new(1)).unwrap();
    array.push(Probe::new(2)).unwrap();
    let (ptr, before) = (array.as_ptr(), live());
    let refused = Some(CapacityError::FixedCapacity { capacity: 2 });
    assert_eq!(array.push(Probe::new(3)).err(), refused);
    assert_eq!(array.insert(0, Probe::new(0)).err(), refused);
    let built = constructed();
    assert_eq!(array.emplace_back(|| Probe::new(4)).err(), refused);
    assert_eq!(constructed(), built);
    assert_eq!(array.len(), 2);
    assert_eq!(array.capacity(), 2);
    assert_eq!(array.as_ptr(), ptr);
    assert_eq!(values(&array), [1, 2]);
    assert_eq!(live(), before);
}

#[test]
fn reallocation_moves_without_constructing_or_dropping() {
    let mut array = probes(&[1, 2, 3]);
    let (built, gone) = (constructed(), dropped());
    array.reserve(64).unwrap();
    array.insert(0, Probe::new(0)).unwrap();
    assert_eq!(constructed(), built + 1);
    assert_eq!(dropped(), gone);
    assert_eq!(values(&array), [0, 1, 2, 3]);
}

#[test]
fn failing_clone_releases_partial_copy() {
    let array = probes(&[1, 2, 3, 4]);
    let before = live();
    fail_after(3);
    expect_panic(|| array.try_clone());
    assert_eq!(live(), before);
    assert_eq!(values(&array), [1, 2, 3, 4]);
}

#[test]
fn failing_sized_construction_leaks_nothing() {
    let before = live();
    fail_after(4);
    expect_panic(|| DynamicArray::<Probe>::with_len(6));
    assert_eq!(live(), before);
}

#[test]
fn failing_resize_keeps_length() {
    let mut array = probes(&[1, 2]);
    let before = live();
    fail_after(3);
    expect_panic(|| array.resize(5));
    assert_eq!(values(&array), [1, 2]);
    assert_eq!(array.capacity(), 5);
    assert_eq!(live(), before);
    array.resize(4).unwrap();
    assert_eq!(values(&array), [1, 2, 0, 0]);
}

#[test]
fn failing_copy_and_swap_assignment_leaves_target_untouched() {
    let mut target = probes(&[1]);
    let source = probes(&[5, 6, 7]);
    let before = live();
    fail_after(2);
    expect_panic(|| target.assign_from(&source));
    assert_eq!(values(&target), [1]);
    assert_eq!(target.capacity(), 1);
    assert_eq!(live(), before);
}

#[test]
fn failing_reuse_assignment_keeps_array_valid() {
    let mut target = probes(&[1, 2]);
    target.reserve(8).unwrap();
    let source = probes(&[5, 6, 7, 8]);
    let before = live();
    // The first two clones overwrite the prefix, the fourth one fails while
    // building the tail.
    fail_after(4);
    expect_panic(|| target.assign_from(&source));
    assert_eq!(target.len(), 2);
    assert_eq!(live(), before);
    drop(target);
    assert_eq!(live(), before - 2);
}

#[test]
fn shrinking_resize_drops_exactly_the_tail() {
    let mut array = probes(&[1, 2, 3, 4, 5]);
    let gone = dropped();
    array.resize(2).unwrap();
    assert_eq!(dropped(), gone + 3);
    assert_eq!(values(&array), [1, 2]);
    assert_eq!(array.capacity(), 5);
}

#[test]
fn growing_resize_appends_defaults() {
    let mut array = probes(&[4, 5]);
    let built = constructed();
    array.resize(5).unwrap();
    assert_eq!(constructed(), built + 3);
    assert_eq!(values(&array), [4, 5, 0, 0, 0]);
}

#[test]
fn drop_destroys_every_live_value() {
    let before = live();
    let mut array = probes(&[1, 2, 3]);
    array.reserve(32).unwrap();
    assert_eq!(live(), before + 3);
    drop(array);
    assert_eq!(live(), before);
}

#[test]
fn partially_consumed_into_iter_drops_the_rest() {
    let before = live();
    let array = probes(&[1, 2, 3, 4]);
    let mut iter = array.into_iter();
    let first = iter.next().unwrap();
    drop(iter);
    assert_eq!(live(), before + 1);
    assert_eq!(first.value, 1);
}

#[test]
fn pop_and_erase_drop_one_value_each() {
    let mut array = probes(&[1, 2, 3, 4]);
    let gone = dropped();
    array.pop_back();
    assert_eq!(array.erase(0), 0);
    assert_eq!(dropped(), gone + 2);
    assert_eq!(values(&array), [2, 3]);
}

thread_local! {
    static BOMB_DROPS: Cell<usize> = const { Cell::new(0) };
}

struct Bomb {
    armed: bool,
}

impl Drop for Bomb {

    fn drop(&mut self) {
        BOMB_DROPS.set(BOMB_DROPS.get() + 1);
        if self.armed {
            panic!("bomb");
        }
    }
}

#[test]
fn panicking_drop_during_erase_leaves_array_consistent() {
    let mut array = DynamicArray::new();
    for armed in [false, true, false] {
        array.push(Bomb { armed }).unwrap();
    }
    expect_panic(|| array.erase(1));
    assert_eq!(array.len(), 2);
    assert!(array.iter().all(|bomb| !bomb.armed));
    let before = BOMB_DROPS.get();
    drop(array);
    assert_eq!(BOMB_DROPS.get(), before + 2);
}
