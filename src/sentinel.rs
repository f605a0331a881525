//! Mapping from reserved "field not recorded" encodings to absent values.
//!
//! Each narrow integer width in the binary source reserves its maximum
//! representable value to mean the device never recorded the field. This
//! check must run on the raw integer, before any scaling or unit
//! conversion, and every extraction path applies it through [`Sentinel`] so
//! the reserved encodings never leak downstream as magnitudes.

/// A raw integer width carrying a reserved "absent" encoding.
pub trait Sentinel: Sized {
    /// Return the value unless it holds the width's reserved encoding.
    fn present(self) -> Option<Self>;
}

macro_rules! sentinel {
    ($($t:ty),*) => {
        $(impl Sentinel for $t {
            fn present(self) -> Option<Self> {
                if self != <$t>::MAX { Some(self) } else { None }
            }
        })*
    };
}

sentinel!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Check-then-convert in one step: the raw value passes through `f` only
/// when it is not the reserved encoding.
pub fn convert<T: Sentinel, U>(raw: T, f: impl FnOnce(T) -> U) -> Option<U> {
    raw.present().map(f)
}
