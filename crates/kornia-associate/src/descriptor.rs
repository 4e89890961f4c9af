use num_traits::AsPrimitive;

/// A fixed-size numeric feature descriptor.
///
/// Implemented for arrays, vectors and boxed slices of any primitive numeric
/// type so the provided score functions work on plain Rust containers.
pub trait Descriptor {
    /// The element type of the descriptor.
    type Elem: AsPrimitive<f64>;

    /// The descriptor values.
    fn values(&self) -> &[Self::Elem];
}

impl<T: AsPrimitive<f64>, const N: usize> Descriptor for [T; N] {
    type Elem = T;

    #[inline(always)]
    fn values(&self) -> &[T] {
        self
    }
}

impl<T: AsPrimitive<f64>> Descriptor for Vec<T> {
    type Elem = T;

    #[inline(always)]
    fn values(&self) -> &[T] {
        self
    }
}

impl<T: AsPrimitive<f64>> Descriptor for Box<[T]> {
    type Elem = T;

    #[inline(always)]
    fn values(&self) -> &[T] {
        self
    }
}
