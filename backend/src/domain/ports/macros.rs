//! Defines helper macros for generating domain port error enums.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_impl $variant () () $( $field : $ty, )*);
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) ) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_impl $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_impl
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    define_port_error! {
        pub enum StubPortError {
            Locked { message: String } => "locked: {message}",
            Retries { count: u32 } => "retries: {count}",
            Both { message: String, count: u32 } => "both: {message} ({count})",
            Empty => "empty",
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = StubPortError::locked("session file");
        assert_eq!(err.to_string(), "locked: session file");
    }

    #[test]
    fn constructors_preserve_non_string_types() {
        let err = StubPortError::retries(3_u32);
        assert_eq!(err.to_string(), "retries: 3");
    }

    #[test]
    fn constructors_support_mixed_fields() {
        let err = StubPortError::both("token", 2_u32);
        assert_eq!(err.to_string(), "both: token (2)");
    }

    #[test]
    fn unit_variants_get_snake_case_constructors() {
        assert_eq!(StubPortError::empty(), StubPortError::Empty);
    }
}
