/// `HandleIndex` type is arbitrary. Devices hand out 32-bits ids, where zero is
/// reserved for "nothing".
pub type HandleIndex = u32;

/// Declares a type-safe, copyable id for objects that live inside a video device.
///
/// The generated type wraps a non-zero `HandleIndex`. Zero never names a device
/// object, so `new(0)` returns `None` instead of a dangling handle.
#[macro_export]
macro_rules! impl_handle {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) $crate::utils::handle::HandleIndex);

        impl $name {
            /// Wraps a raw device id, returns `None` for zero.
            #[inline]
            pub fn new(index: $crate::utils::handle::HandleIndex) -> Option<Self> {
                if index == 0 {
                    None
                } else {
                    Some($name(index))
                }
            }

            /// Returns the raw device id.
            #[inline]
            pub fn index(self) -> $crate::utils::handle::HandleIndex {
                self.0
            }
        }

        impl From<$name> for $crate::utils::handle::HandleIndex {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}
