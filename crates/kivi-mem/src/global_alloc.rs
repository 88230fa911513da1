use std::alloc::{Layout, alloc, dealloc};

use core::{
    any::type_name,
    ptr::NonNull,
};

use crate::errors::CapacityError::{self, AllocFailed, CapacityOverflow};

/// Thin layer over the global allocator, sized in element slots.
pub struct GlobalAlloc;

impl GlobalAlloc {

    /// Allocates uninitialized memory for `count` slots of `T`.
    ///
    /// Zero slots, or a zero-sized `T`, allocate nothing and return a
    /// dangling pointer.
    pub fn allocate_uninit<T>(&self, count: usize) -> Result<NonNull<T>, CapacityError> {
        if count == 0 {
            return Ok(NonNull::dangling())
        }
        let layout = Layout::array::<T>(count)
            .map_err(|_| CapacityOverflow { requested: count })?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling())
        }
        let ptr = unsafe { alloc(layout) };
        match NonNull::new(ptr.cast::<T>()) {
            Some(ptr) => Ok(ptr),
            None => {
                kivi_log::warn!(
                    "allocator refused {} bytes for {} slots of {}",
                    layout.size(), count, type_name::<T>(),
                );
                Err(AllocFailed { new_capacity: count })
            },
        }
    }

    /// # Safety
    /// `ptr` must come from [`GlobalAlloc::allocate_uninit`] with the same
    /// `count`, and must not be freed twice.
    pub unsafe fn free_uninit<T>(&self, ptr: NonNull<T>, count: usize) {
        if count == 0 {
            return
        }
        let layout = match Layout::array::<T>(count) {
            Ok(l) => l,
            Err(_) => return,
        };
        if layout.size() == 0 {
            return
        }
        unsafe { dealloc(ptr.as_ptr().cast::<u8>(), layout) }
    }
}

pub static GLOBAL_ALLOC: GlobalAlloc = GlobalAlloc;
