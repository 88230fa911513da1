/// Builds a [`DynamicArray`](crate::DynamicArray) from a list of values.
///
/// Panics if the allocation fails.
#[macro_export]
macro_rules! dyn_array {
    () => {
        $crate::DynamicArray::new()
    };
    [$($elem:expr),+ $(,)?] => {
        <$crate::DynamicArray<_>>::from([$($elem),+])
    };
}
