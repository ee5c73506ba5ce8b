use num_traits::{One, PrimInt};
use serde::{Deserialize, Serialize};

/// Collision layer filter used by the scanner. One bit per layer, 32 layers.
pub type LayerMask = BitmaskFlags<u32>;

/// Trait implemented by layer enums.
///
/// The enum's discriminant (via `#[repr(u8)]`) determines the bit index.
/// The backing integer type is chosen via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A plain bitmask container.
///
/// Serialized transparently as its backing integer so configuration files can
/// write `scan_layers = 5`.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    /// Every bit set: matches any layer.
    pub fn all() -> Self {
        Self { bits: !T::zero() }
    }

    /// No bit set: matches nothing.
    pub fn none() -> Self {
        Self { bits: T::zero() }
    }

    /// Build a mask from a list of layers.
    pub fn from_layers<U: FlagBitmask<Storage = T> + Copy>(layers: &[U]) -> Self {
        let mut flags = Self::none();
        flags.add_many(layers);
        flags
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.add(tag);
        }
    }

    /// True when `membership` shares at least one bit with this filter.
    ///
    /// This is the test applied to a collider's layer bits during a cast.
    pub fn accepts(&self, membership: T) -> bool {
        (self.bits & membership) != T::zero()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }
}

/// Declare a layer enum and implement `FlagBitmask` for it.
///
/// Example:
/// ```rust
/// scanner::define_bitmask_flags!(SurfaceLayer, u32, {
///     Ground,
///     Ramp,
///     Vehicle,
/// });
/// ```
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}
