//! `define_port_error!`: port error enums with `impl Into` constructors
//! named after each variant.
//!
//! ```ignore
//! define_port_error! {
//!     pub enum LookupError {
//!         Unreachable { message: String } => "unreachable: {message}",
//!         Closed => "closed",
//!     }
//! }
//! let err = LookupError::unreachable("refused");
//! ```

macro_rules! define_port_error {
    (
        $(#[$enum_attr:meta])*
        pub enum $name:ident {
            $(
                $(#[$attr:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $display:literal
            ),* $(,)?
        }
    ) => {
        $(#[$enum_attr])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$attr])*
                #[error($display)]
                $variant $( { $($field: $ty),* } )?,
            )*
        }

        impl $name {
            $( define_port_error!(@constructor $variant $( $($field: $ty),* )?); )*
        }
    };

    (@constructor $variant:ident) => {
        ::paste::paste! {
            #[doc = "Build [`Self::" $variant "`]."]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident $($field:ident: $ty:ty),+) => {
        ::paste::paste! {
            #[doc = "Build [`Self::" $variant "`]."]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),+) -> Self {
                Self::$variant { $($field: $field.into()),+ }
            }
        }
    };
}

pub(crate) use define_port_error;
