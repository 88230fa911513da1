use core::{
    convert::Infallible,
    error,
    fmt::{self, Display, Formatter},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CapacityError {
    AllocFailed {
        new_capacity: usize,
    },
    CapacityOverflow {
        requested: usize,
    },
    FixedCapacity {
        capacity: usize,
    },
}

impl Display for CapacityError {

    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocFailed { new_capacity } => {
                write!(f, "allocation failed with new capacity {}", new_capacity)
            },
            Self::CapacityOverflow { requested } => {
                write!(f, "capacity overflow when requesting {} slots", requested)
            },
            Self::FixedCapacity { capacity } => {
                write!(f, "exceeded fixed capacity of {}", capacity)
            },
        }
    }
}

impl error::Error for CapacityError {}

/// Failure of an operation whose element constructor is itself fallible.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ElementError<E> {
    Capacity(CapacityError),
    Element(E),
}

impl<E> ElementError<E> {

    #[inline(always)]
    pub fn element(self) -> Option<E> {
        match self {
            Self::Element(err) => Some(err),
            Self::Capacity(_) => None,
        }
    }
}

impl ElementError<Infallible> {

    #[inline(always)]
    pub fn into_capacity(self) -> CapacityError {
        match self {
            Self::Capacity(err) => err,
            Self::Element(never) => match never {},
        }
    }
}

impl<E> From<CapacityError> for ElementError<E> {

    fn from(value: CapacityError) -> Self {
        Self::Capacity(value)
    }
}

impl<E: Display> Display for ElementError<E> {

    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capacity(err) => write!(f, "{}", err),
            Self::Element(err) => write!(f, "element construction failed: {}", err),
        }
    }
}

impl<E: error::Error + 'static> error::Error for ElementError<E> {

    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Capacity(err) => Some(err),
            Self::Element(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_error_messages() {
        assert_eq!(
            CapacityError::AllocFailed { new_capacity: 8 }.to_string(),
            "allocation failed with new capacity 8",
        );
        assert_eq!(
            CapacityError::FixedCapacity { capacity: 4 }.to_string(),
            "exceeded fixed capacity of 4",
        );
    }

    #[test]
    fn element_error_exposes_source() {
        use core::error::Error;
        let err: ElementError<CapacityError> = ElementError::Element(
            CapacityError::CapacityOverflow { requested: 3 }
        );
        assert!(err.source().is_some());
        assert_eq!(err.element(), Some(CapacityError::CapacityOverflow { requested: 3 }));
        let err: ElementError<Infallible> = CapacityError::FixedCapacity { capacity: 1 }.into();
        assert_eq!(err.into_capacity(), CapacityError::FixedCapacity { capacity: 1 });
    }
}
