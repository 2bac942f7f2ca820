use core::{alloc::Layout, fmt};

/// Broad classification of an [`ArrayError`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    /// The caller broke a precondition, this is a programming error.
    ContractViolation,
    /// The storage could not get the memory it needed.
    AllocFailure,
}

/// Error returned by the fallible (`try_*`) array operations.
///
/// When an operation returns an error, the array is left exactly as it was before the call.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArrayError {
    /// The computed capacity does not fit in `isize::MAX` bytes.
    CapacityOverflow,
    /// The allocator failed to provide memory for the given layout.
    AllocError(Layout),
    /// The storage has a fixed bound which would be exceeded.
    CapacityExceeded { capacity: usize, required: usize },
    /// An index was not valid for the array.
    IndexOutOfBounds { index: usize, len: usize },
    /// A range of `count` elements starting at `start` does not fit in the array.
    RangeOutOfBounds { start: usize, count: usize, len: usize },
    /// The operation needs at least one element.
    EmptyArray,
}

impl ArrayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArrayError::CapacityOverflow |
            ArrayError::AllocError(_) => ErrorKind::AllocFailure,
            ArrayError::CapacityExceeded { .. } |
            ArrayError::IndexOutOfBounds { .. } |
            ArrayError::RangeOutOfBounds { .. } |
            ArrayError::EmptyArray => ErrorKind::ContractViolation,
        }
    }

    pub fn is_contract_violation(&self) -> bool {
        self.kind() == ErrorKind::ContractViolation
    }
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayError::CapacityOverflow => f.write_str("capacity overflow"),
            ArrayError::AllocError(layout) => write!(f, "failed to allocate {} bytes (align {})", layout.size(), layout.align()),
            ArrayError::CapacityExceeded { capacity, required } => write!(f, "capacity exceeded: storage is limited to {capacity} elements, but {required} are required"),
            ArrayError::IndexOutOfBounds { index, len } => write!(f, "index (is {index}) should be < len (is {len})"),
            ArrayError::RangeOutOfBounds { start, count, len } => write!(f, "range of {count} elements starting at {start} is out of bounds for len {len}"),
            ArrayError::EmptyArray => f.write_str("array is empty"),
        }
    }
}

impl std::error::Error for ArrayError {}
