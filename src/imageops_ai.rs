mod alpha_mask_applicable;
mod flatten;

pub use alpha_mask_applicable::AlphaMaskApplicable;
pub use flatten::Flatten;

use num_traits::{Bounded, NumCast};
use std::any::TypeId;

pub fn is_floating_point<T: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<f32>() || TypeId::of::<T>() == TypeId::of::<f64>()
}

/// Value of a fully saturated channel: `1.0` for float buffers, `T::MAX` otherwise.
pub fn get_max_value<T: Bounded + NumCast + 'static>() -> T {
    if is_floating_point::<T>() {
        T::from(1.0).unwrap_or_else(T::max_value)
    } else {
        T::max_value()
    }
}
