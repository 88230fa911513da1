use core::{
    marker::PhantomData,
    mem,
    ptr::NonNull,
};

use crate::{
    errors::CapacityError,
    global_alloc::GLOBAL_ALLOC,
};

/// One block of uninitialized memory with room for `capacity` values of `T`.
///
/// The storage never constructs or drops a `T`. Which slots hold live values
/// is the owner's business, and the owner must drop them before the storage
/// goes away. Dropping `RawStorage` only releases the block.
///
/// There is no `Clone`: duplicating the block would either alias the
/// ownership or copy uninitialized bytes. Ownership moves with
/// [`RawStorage::take`] and [`RawStorage::swap`].
pub struct RawStorage<T> {
    buffer: NonNull<T>,
    capacity: usize,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send> Send for RawStorage<T> {}
unsafe impl<T: Sync> Sync for RawStorage<T> {}

impl<T> RawStorage<T> {

    /// Storage with no allocation and zero capacity.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            buffer: NonNull::dangling(),
            capacity: 0,
            _marker: PhantomData,
        }
    }

    /// Allocates a block for `capacity` slots, once and up front.
    ///
    /// A request for zero slots allocates nothing.
    pub fn allocate(capacity: usize) -> Result<Self, CapacityError> {
        let buffer = GLOBAL_ALLOC.allocate_uninit(capacity)?;
        Ok(Self {
            buffer,
            capacity,
            _marker: PhantomData,
        })
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline(always)]
    pub fn as_non_null(&self) -> NonNull<T> {
        self.buffer
    }

    /// Address of slot `index`, whether or not it holds a live value.
    ///
    /// # Safety
    /// `index <= capacity`. One past the end is allowed so the result can
    /// serve as an end pointer.
    #[inline(always)]
    pub unsafe fn slot(&self, index: usize) -> NonNull<T> {
        debug_assert!(index <= self.capacity, "slot {} out of capacity {}", index, self.capacity);
        unsafe { self.buffer.add(index) }
    }

    /// Moves the block out, leaving `self` with no allocation.
    #[inline(always)]
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::new())
    }

    #[inline(always)]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.buffer, &mut other.buffer);
        mem::swap(&mut self.capacity, &mut other.capacity);
    }

    /// Relocates `count` live values from `src` into fresh slots at `dst`.
    ///
    /// A Rust move is a bitwise copy that cannot fail, so relocation never
    /// leaves the source half moved. Afterwards the source slots are
    /// logically uninitialized and must not be dropped.
    ///
    /// # Safety
    /// `src` must hold `count` live values, `dst` must have room for `count`
    /// values, and the two ranges must not overlap.
    #[inline(always)]
    pub unsafe fn transfer(src: NonNull<T>, count: usize, dst: NonNull<T>) {
        unsafe {
            src.copy_to_nonoverlapping(dst, count);
        }
    }
}

impl<T> Default for RawStorage<T> {

    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for RawStorage<T> {

    fn drop(&mut self) {
        unsafe {
            GLOBAL_ALLOC.free_uninit(self.buffer, self.capacity);
        }
    }
}
