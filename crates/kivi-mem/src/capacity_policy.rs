/// Decides how much capacity an append asks for once the current block is
/// full.
pub trait CapacityPolicy {
    fn can_grow() -> bool;

    /// New capacity for a full array of `current` slots that needs at least
    /// `required`. `None` if the result is not representable.
    fn grow(current: usize, required: usize) -> Option<usize>;
}

/// Doubles the capacity, starting from a single slot.
pub struct Doubling {}

impl CapacityPolicy for Doubling {

    #[inline]
    fn can_grow() -> bool {
        true
    }

    #[inline]
    fn grow(current: usize, required: usize) -> Option<usize> {
        Some(current.checked_mul(2)?.max(required).max(1))
    }
}

/// Never grows on append. Capacity only changes through an explicit reserve.
pub struct Fixed {}

impl CapacityPolicy for Fixed {

    #[inline]
    fn can_grow() -> bool {
        false
    }

    #[inline]
    fn grow(_: usize, _: usize) -> Option<usize> {
        None
    }
}
