use core::{
    any::type_name,
    convert::Infallible,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    mem::{self, ManuallyDrop},
    ops::{Index, IndexMut, Deref, DerefMut},
    ptr::{self, NonNull},
    slice,
};

use crate::{
    capacity_policy::{CapacityPolicy, Doubling},
    errors::{CapacityError, ElementError},
    iter::{Iter, IterMut, IntoIter},
    raw_storage::RawStorage,
};

use CapacityError::{CapacityOverflow, FixedCapacity};

/// Growable, contiguous array on top of a single [`RawStorage`].
///
/// Slots `[0, len)` hold live values; slots `[len, capacity)` are
/// uninitialized and are never read, dropped or handed out.
///
/// Fallible operations report allocation failure as a [`CapacityError`]
/// and leave the array as it was. A panicking constructor, `clone` or
/// `Drop` of `T` unwinds through the array without leaking or double
/// dropping; each method documents the state it leaves behind in that case.
pub struct DynamicArray<T, P: CapacityPolicy = Doubling> {
    storage: RawStorage<T>,
    len: usize,
    _policy: PhantomData<fn() -> P>,
}

/// Values being constructed into consecutive uninitialized slots.
///
/// If the run is abandoned before [`PartialRun::finish`], the values built so
/// far are dropped.
struct PartialRun<T> {
    start: NonNull<T>,
    built: usize,
}

impl<T> PartialRun<T> {

    #[inline(always)]
    fn new(start: NonNull<T>) -> Self {
        Self {
            start,
            built: 0,
        }
    }

    /// # Safety
    /// The slot after the last pushed value must be uninitialized memory
    /// owned by the caller.
    #[inline(always)]
    unsafe fn push(&mut self, value: T) {
        unsafe { self.start.add(self.built).write(value) };
        self.built += 1;
    }

    /// Keeps the values and returns how many there are.
    #[inline(always)]
    fn finish(self) -> usize {
        let built = self.built;
        mem::forget(self);
        built
    }
}

impl<T> Drop for PartialRun<T> {

    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.start.as_ptr(), self.built));
        }
    }
}

#[cold]
#[track_caller]
fn capacity_panic(err: CapacityError) -> ! {
    panic!("{}", err)
}

impl<T> DynamicArray<T, Doubling> {

    /// Empty array, no allocation.
    #[inline(always)]
    pub const fn new() -> Self {
        Self::new_in()
    }
}

impl<T, P: CapacityPolicy> DynamicArray<T, P> {

    /// Empty array with an explicit capacity policy.
    #[inline(always)]
    pub const fn new_in() -> Self {
        Self {
            storage: RawStorage::new(),
            len: 0,
            _policy: PhantomData,
        }
    }

    #[inline(always)]
    fn from_parts(storage: RawStorage<T>, len: usize) -> Self {
        Self {
            storage,
            len,
            _policy: PhantomData,
        }
    }

    /// Empty array with room for exactly `capacity` values.
    pub fn with_capacity(capacity: usize) -> Result<Self, CapacityError> {
        Ok(Self::from_parts(RawStorage::allocate(capacity)?, 0))
    }

    /// `len` default values in a block of exactly `len` slots.
    pub fn with_len(len: usize) -> Result<Self, CapacityError>
        where
            T: Default,
    {
        Self::with_len_with(len, T::default)
    }

    /// `len` values produced by `f`, in a block of exactly `len` slots.
    ///
    /// If `f` panics, the values already produced are dropped and the block
    /// is released.
    pub fn with_len_with<F>(len: usize, mut f: F) -> Result<Self, CapacityError>
        where
            F: FnMut() -> T,
    {
        Self::try_with_len_with(len, || Ok::<T, Infallible>(f()))
            .map_err(ElementError::into_capacity)
    }

    /// Like [`DynamicArray::with_len_with`], stopping at the first error
    /// from `f`.
    pub fn try_with_len_with<F, E>(len: usize, mut f: F) -> Result<Self, ElementError<E>>
        where
            F: FnMut() -> Result<T, E>,
    {
        let storage = RawStorage::allocate(len)?;
        let mut run = PartialRun::new(storage.as_non_null());
        for _ in 0..len {
            let value = f().map_err(ElementError::Element)?;
            unsafe { run.push(value) };
        }
        let len = run.finish();
        Ok(Self::from_parts(storage, len))
    }

    /// Deep copy into a fresh block sized to `self.len()`.
    ///
    /// `self` is only read. If a `clone` panics, the copies made so far are
    /// dropped and the new block is released.
    pub fn try_clone(&self) -> Result<Self, CapacityError>
        where
            T: Clone,
    {
        let storage = RawStorage::allocate(self.len)?;
        let mut run = PartialRun::new(storage.as_non_null());
        for value in self.iter() {
            unsafe { run.push(value.clone()) };
        }
        let len = run.finish();
        Ok(Self::from_parts(storage, len))
    }

    /// Moves the contents out in O(1).
    ///
    /// `self` is left empty with no allocation and can be used again.
    #[inline(always)]
    pub fn take(&mut self) -> Self {
        let len = mem::replace(&mut self.len, 0);
        Self::from_parts(self.storage.take(), len)
    }

    /// Replaces the contents with those of `other`, leaving `other` empty.
    ///
    /// The previous values are dropped and the previous block released.
    #[inline(always)]
    pub fn move_from(&mut self, other: &mut Self) {
        *self = other.take();
    }

    /// Makes `self` an elementwise copy of `other`.
    ///
    /// If `other` does not fit in the current capacity, a full copy is built
    /// first and swapped in, so a failure leaves `self` untouched. Otherwise
    /// the existing block is reused: the common prefix is assigned with
    /// `clone_from`, then the excess is dropped or the missing tail is cloned
    /// in. A `clone` panicking on this path leaves `self` valid, with some of
    /// the prefix already overwritten and the old length kept.
    pub fn assign_from(&mut self, other: &Self) -> Result<(), CapacityError>
        where
            T: Clone,
    {
        if other.len > self.capacity() {
            let mut copy = other.try_clone()?;
            self.swap(&mut copy);
            return Ok(())
        }
        let common = self.len.min(other.len);
        self.as_mut_slice()[..common].clone_from_slice(&other.as_slice()[..common]);
        if other.len < self.len {
            self.truncate(other.len);
        }
        else {
            let mut run = PartialRun::new(unsafe { self.storage.slot(self.len) });
            for value in &other.as_slice()[self.len..] {
                unsafe { run.push(value.clone()) };
            }
            self.len += run.finish();
        }
        Ok(())
    }

    /// Exchanges the contents of two arrays in O(1).
    #[inline(always)]
    pub fn swap(&mut self, other: &mut Self) {
        self.storage.swap(&mut other.storage);
        mem::swap(&mut self.len, &mut other.len);
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    #[inline(always)]
    pub fn as_ptr(&self) -> *const T {
        self.storage.as_non_null().as_ptr()
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.storage.as_non_null().as_ptr()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), self.len) }
    }

    /// # Safety
    /// `index < self.len()`. Only checked in debug builds.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len, "index {} out of bounds for length {}", index, self.len);
        unsafe { self.storage.slot(index).as_ref() }
    }

    /// # Safety
    /// `index < self.len()`. Only checked in debug builds.
    #[inline(always)]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len, "index {} out of bounds for length {}", index, self.len);
        unsafe { self.storage.slot(index).as_mut() }
    }

    #[inline(always)]
    pub fn back(&self) -> Option<&T> {
        if self.len == 0 {
            None
        }
        else {
            Some(unsafe { self.storage.slot(self.len - 1).as_ref() })
        }
    }

    #[inline(always)]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        if self.len == 0 {
            None
        }
        else {
            Some(unsafe { self.storage.slot(self.len - 1).as_mut() })
        }
    }

    #[inline(always)]
    pub fn iter(&self) -> Iter<'_, T> {
        unsafe { Iter::new(self.storage.as_non_null(), self.len) }
    }

    #[inline(always)]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        unsafe { IterMut::new(self.storage.as_non_null(), self.len) }
    }

    /// Makes the capacity at least `capacity`, allocating exactly that many
    /// slots if it has to grow. The length and the values are unchanged.
    ///
    /// A no-op when the capacity is already large enough.
    pub fn reserve(&mut self, capacity: usize) -> Result<(), CapacityError> {
        if capacity <= self.capacity() {
            return Ok(())
        }
        let mut new_storage = self.allocate_grown(capacity)?;
        unsafe {
            RawStorage::transfer(self.storage.as_non_null(), self.len, new_storage.as_non_null());
        }
        self.storage.swap(&mut new_storage);
        Ok(())
    }

    fn allocate_grown(&self, new_capacity: usize) -> Result<RawStorage<T>, CapacityError> {
        let storage = RawStorage::allocate(new_capacity)?;
        kivi_log::trace!(
            "reallocating {} from {} to {} slots",
            type_name::<T>(), self.capacity(), new_capacity,
        );
        Ok(storage)
    }

    fn grown_capacity(&self) -> Result<usize, CapacityError> {
        let current = self.capacity();
        if !P::can_grow() {
            kivi_log::warn!("append refused at fixed capacity {}", current);
            return Err(FixedCapacity { capacity: current })
        }
        P::grow(current, self.len + 1)
            .ok_or(CapacityOverflow { requested: self.len.saturating_add(1) })
    }

    /// Sets the length to `len`, filling new slots with `T::default()`.
    pub fn resize(&mut self, len: usize) -> Result<(), CapacityError>
        where
            T: Default,
    {
        self.resize_with(len, T::default)
    }

    /// Sets the length to `len`.
    ///
    /// Shrinking drops the values past `len`. Growing reserves exactly `len`
    /// slots if needed, then fills the new slots with `f()`. If `f` panics,
    /// the new values are dropped and the length is unchanged. Any capacity
    /// already reserved is kept.
    pub fn resize_with<F>(&mut self, len: usize, mut f: F) -> Result<(), CapacityError>
        where
            F: FnMut() -> T,
    {
        self.try_resize_with(len, || Ok::<T, Infallible>(f()))
            .map_err(ElementError::into_capacity)
    }

    /// Like [`DynamicArray::resize_with`], stopping at the first error from
    /// `f`, which leaves the length unchanged.
    pub fn try_resize_with<F, E>(&mut self, len: usize, mut f: F) -> Result<(), ElementError<E>>
        where
            F: FnMut() -> Result<T, E>,
    {
        if len <= self.len {
            self.truncate(len);
            return Ok(())
        }
        self.reserve(len)?;
        let mut run = PartialRun::new(unsafe { self.storage.slot(self.len) });
        for _ in self.len..len {
            let value = f().map_err(ElementError::Element)?;
            unsafe { run.push(value) };
        }
        self.len += run.finish();
        Ok(())
    }

    /// Drops every value past `len`. Does nothing if `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return
        }
        let excess = self.len - len;
        self.len = len;
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.storage.slot(len).as_ptr(),
                excess,
            ));
        }
    }

    /// Drops every value, keeping the capacity.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.truncate(0)
    }

    #[inline(always)]
    pub fn push(&mut self, value: T) -> Result<&mut T, CapacityError> {
        self.emplace(self.len, || value)
    }

    #[inline(always)]
    pub fn emplace_back<F>(&mut self, f: F) -> Result<&mut T, CapacityError>
        where
            F: FnOnce() -> T,
    {
        self.emplace(self.len, f)
    }

    #[inline(always)]
    pub fn try_emplace_back<F, E>(&mut self, f: F) -> Result<&mut T, ElementError<E>>
        where
            F: FnOnce() -> Result<T, E>,
    {
        self.try_emplace(self.len, f)
    }

    #[inline(always)]
    pub fn insert(&mut self, index: usize, value: T) -> Result<&mut T, CapacityError> {
        self.emplace(index, || value)
    }

    /// Inserts the value built by `f` before `index`.
    ///
    /// `f` runs before any existing value moves. If `f` panics or the
    /// allocation fails, the array is unchanged.
    ///
    /// # Panics
    /// If `index > self.len()`.
    pub fn emplace<F>(&mut self, index: usize, f: F) -> Result<&mut T, CapacityError>
        where
            F: FnOnce() -> T,
    {
        self.try_emplace(index, || Ok::<T, Infallible>(f()))
            .map_err(ElementError::into_capacity)
    }

    /// Like [`DynamicArray::emplace`] with a fallible constructor. An error
    /// from `f` leaves the array unchanged.
    pub fn try_emplace<F, E>(&mut self, index: usize, f: F) -> Result<&mut T, ElementError<E>>
        where
            F: FnOnce() -> Result<T, E>,
    {
        if index > self.len {
            panic!("index {} was out of bounds with len {} when inserting", index, self.len)
        }
        if self.len == self.capacity() {
            self.emplace_with_realloc(index, f)
        }
        else {
            self.emplace_without_realloc(index, f)
        }
    }

    fn emplace_with_realloc<F, E>(&mut self, index: usize, f: F) -> Result<&mut T, ElementError<E>>
        where
            F: FnOnce() -> Result<T, E>,
    {
        let new_capacity = self.grown_capacity()?;
        let mut new_storage = self.allocate_grown(new_capacity)?;
        // The new value goes into the fresh block first; until the swap below
        // the old block is never touched.
        let value = f().map_err(ElementError::Element)?;
        unsafe {
            let old = self.storage.as_non_null();
            let new = new_storage.as_non_null();
            new.add(index).write(value);
            RawStorage::transfer(old, index, new);
            RawStorage::transfer(old.add(index), self.len - index, new.add(index + 1));
        }
        self.storage.swap(&mut new_storage);
        self.len += 1;
        Ok(unsafe { self.storage.slot(index).as_mut() })
    }

    fn emplace_without_realloc<F, E>(&mut self, index: usize, f: F) -> Result<&mut T, ElementError<E>>
        where
            F: FnOnce() -> Result<T, E>,
    {
        let value = f().map_err(ElementError::Element)?;
        unsafe {
            let slot = self.storage.slot(index);
            if index < self.len {
                slot.copy_to(slot.add(1), self.len - index);
            }
            slot.write(value);
        }
        self.len += 1;
        Ok(unsafe { self.storage.slot(index).as_mut() })
    }

    /// Removes and returns the last value.
    #[inline(always)]
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None
        }
        self.len -= 1;
        Some(unsafe { self.storage.slot(self.len).read() })
    }

    /// Drops the last value, if any.
    #[inline(always)]
    pub fn pop_back(&mut self) {
        drop(self.pop())
    }

    /// Removes the value at `index`, shifting the tail down by one.
    ///
    /// # Panics
    /// If `index >= self.len()`.
    pub fn remove(&mut self, index: usize) -> T {
        if index >= self.len {
            panic!("index {} was out of bounds with len {} when removing", index, self.len)
        }
        unsafe {
            let slot = self.storage.slot(index);
            let removed = slot.read();
            slot.add(1).copy_to(slot, self.len - index - 1);
            self.len -= 1;
            removed
        }
    }

    /// Drops the value at `index` and returns the position of the value that
    /// followed it, which is `index` itself.
    ///
    /// The length is already updated when the removed value is dropped, so a
    /// panicking `Drop` leaves the array consistent.
    ///
    /// # Panics
    /// If `index >= self.len()`.
    #[inline(always)]
    pub fn erase(&mut self, index: usize) -> usize {
        drop(self.remove(index));
        index
    }

    pub fn contains(&self, value: &T) -> bool
        where
            T: PartialEq,
    {
        self.iter().any(|v| v == value)
    }
}

impl<T, P: CapacityPolicy> Drop for DynamicArray<T, P> {

    fn drop(&mut self) {
        let len = mem::replace(&mut self.len, 0);
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.storage.as_non_null().as_ptr(),
                len,
            ));
        }
    }
}

impl<T, P: CapacityPolicy> Default for DynamicArray<T, P> {

    #[inline(always)]
    fn default() -> Self {
        Self::new_in()
    }
}

impl<T: Clone, P: CapacityPolicy> Clone for DynamicArray<T, P> {

    /// # Panics
    /// If the allocation fails. Use [`DynamicArray::try_clone`] to handle
    /// that case.
    fn clone(&self) -> Self {
        self.try_clone().unwrap_or_else(|err| capacity_panic(err))
    }

    fn clone_from(&mut self, source: &Self) {
        if let Err(err) = self.assign_from(source) {
            capacity_panic(err)
        }
    }
}

impl<T: Debug, P: CapacityPolicy> Debug for DynamicArray<T, P> {

    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, P: CapacityPolicy, Q: CapacityPolicy> PartialEq<DynamicArray<T, Q>> for DynamicArray<T, P> {

    #[inline(always)]
    fn eq(&self, other: &DynamicArray<T, Q>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, P: CapacityPolicy> Eq for DynamicArray<T, P> {}

impl<T: PartialEq, P: CapacityPolicy> PartialEq<[T]> for DynamicArray<T, P> {

    #[inline(always)]
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq, P: CapacityPolicy, const N: usize> PartialEq<[T; N]> for DynamicArray<T, P> {

    #[inline(always)]
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, P: CapacityPolicy> Index<usize> for DynamicArray<T, P> {

    type Output = T;

    #[inline(always)]
    fn index(&self, index: usize) -> &Self::Output {
        if index >= self.len {
            panic!("index {} out of bounds for length {}", index, self.len)
        }
        unsafe { self.storage.slot(index).as_ref() }
    }
}

impl<T, P: CapacityPolicy> IndexMut<usize> for DynamicArray<T, P> {

    #[inline(always)]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        if index >= self.len {
            panic!("index {} out of bounds for length {}", index, self.len)
        }
        unsafe { self.storage.slot(index).as_mut() }
    }
}

impl<T, P: CapacityPolicy> AsRef<[T]> for DynamicArray<T, P> {

    #[inline(always)]
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, P: CapacityPolicy> AsMut<[T]> for DynamicArray<T, P> {

    #[inline(always)]
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, P: CapacityPolicy> Deref for DynamicArray<T, P> {

    type Target = [T];

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T, P: CapacityPolicy> DerefMut for DynamicArray<T, P> {

    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<'a, T, P: CapacityPolicy> IntoIterator for &'a DynamicArray<T, P> {

    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, P: CapacityPolicy> IntoIterator for &'a mut DynamicArray<T, P> {

    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, P: CapacityPolicy> IntoIterator for DynamicArray<T, P> {

    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        let mut this = ManuallyDrop::new(self);
        let len = this.len;
        unsafe { IntoIter::new(this.storage.take(), len) }
    }
}

impl<T, P: CapacityPolicy> Extend<T> for DynamicArray<T, P> {

    /// Grows by the policy, not to an exact fit, so repeated small extends
    /// stay amortized O(1) per value.
    ///
    /// # Panics
    /// If growing the array fails.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let required = self.len.saturating_add(iter.size_hint().0);
        if P::can_grow() && required > self.capacity() {
            let capacity = P::grow(self.capacity(), required)
                .map_or(required, |grown| grown.max(required));
            if let Err(err) = self.reserve(capacity) {
                capacity_panic(err)
            }
        }
        for value in iter {
            if let Err(err) = self.push(value) {
                capacity_panic(err)
            }
        }
    }
}

impl<T, P: CapacityPolicy> FromIterator<T> for DynamicArray<T, P> {

    /// A policy that cannot grow gets exactly as many slots as there are
    /// values, however loose the iterator's size hint is.
    ///
    /// # Panics
    /// If the allocation fails.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        if P::can_grow() {
            let mut array = match Self::with_capacity(iter.size_hint().0) {
                Ok(array) => array,
                Err(err) => capacity_panic(err),
            };
            array.extend(iter);
            return array
        }
        let mut staged = DynamicArray::<T>::new();
        staged.extend(iter);
        let mut array = match Self::with_capacity(staged.len) {
            Ok(array) => array,
            Err(err) => capacity_panic(err),
        };
        unsafe {
            RawStorage::transfer(staged.storage.as_non_null(), staged.len, array.storage.as_non_null());
        }
        array.len = mem::replace(&mut staged.len, 0);
        array
    }
}

impl<T, const N: usize> From<[T; N]> for DynamicArray<T> {

    fn from(values: [T; N]) -> Self {
        let mut array = match Self::with_capacity(N) {
            Ok(array) => array,
            Err(err) => capacity_panic(err),
        };
        let mut run = PartialRun::new(array.storage.as_non_null());
        for value in values {
            unsafe { run.push(value) };
        }
        array.len = run.finish();
        array
    }
}
