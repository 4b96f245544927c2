//! Macros for ergonomic state names.

/// Generate an enum whose variants can be passed anywhere a state name is
/// expected.
///
/// Each variant maps to a string label: the variant name itself, or an
/// explicit literal given with `= "label"`.
///
/// # Example
///
/// ```
/// use statekeeper::state_enum;
///
/// state_enum! {
///     pub enum AccountState {
///         Active = "active",
///         Deleted = "deleted",
///         Special,
///     }
/// }
///
/// assert_eq!(AccountState::Active.name(), "active");
/// assert_eq!(AccountState::Special.as_ref(), "Special");
/// assert_eq!(AccountState::ALL.len(), 3);
/// assert_eq!(AccountState::parse("deleted"), Some(AccountState::Deleted));
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $(= $label:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$(Self::$variant),*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $crate::__state_label!($variant $(, $label)?)),*
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|s| s.name() == value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.name()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __state_label {
    ($variant:ident) => {
        stringify!($variant)
    };
    ($variant:ident, $label:literal) => {
        $label
    };
}
