use super::{ConfigError, ExecInvariantViolation};

use alloc::vec::Vec;

use ndarray::{ArrayBase, Data, DataMut, Ix1};

/// Adapter trait for reading contiguous 1D input.
pub trait Read1D<T> {
    /// Borrow the underlying input as a contiguous slice.
    fn read_slice(&self) -> Result<&[T], ConfigError>;
}

/// Adapter trait for writing contiguous 1D output.
pub trait Write1D<T> {
    /// Borrow the underlying output as a mutable contiguous slice.
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError>;
}

macro_rules! impl_contiguous {
    ($([$($gen:tt)*] $ty:ty),* $(,)?) => {
        $(
            impl<$($gen)*> Read1D<T> for $ty {
                fn read_slice(&self) -> Result<&[T], ConfigError> {
                    Ok(&self[..])
                }
            }

            impl<$($gen)*> Write1D<T> for $ty {
                fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
                    Ok(&mut self[..])
                }
            }
        )*
    };
}

impl_contiguous!([T] [T], [T, const N: usize] [T; N], [T] Vec<T>);

/// Owned arrays and views; strided views are rejected.
impl<S, T> Read1D<T> for ArrayBase<S, Ix1>
where
    S: Data<Elem = T>,
{
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

impl<S, T> Write1D<T> for ArrayBase<S, Ix1>
where
    S: DataMut<Elem = T>,
{
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_mut()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

/// Bind `out` and require exactly `expected` elements.
pub(crate) fn output_of_len<T, O>(
    out: &mut O,
    expected: usize,
) -> Result<&mut [T], ExecInvariantViolation>
where
    O: Write1D<T> + ?Sized,
{
    let slice = out.write_slice_mut()?;
    if slice.len() != expected {
        return Err(ExecInvariantViolation::LengthMismatch {
            arg: "out",
            expected,
            got: slice.len(),
        });
    }
    Ok(slice)
}
