// SPDX-License-Identifier: MIT

#[macro_export]
/// Defines the set of VTOC slice tags, along with raw constants, slot predicates and the tag enum.
///
/// This macro generates:
/// - A constant `u16` for each tag code, as stored in the VTOC.
/// - A function to check whether a slot carries a given tag.
/// - An enum `SliceTag` representing all defined tags and an `Unknown` variant for unrecognized codes.
/// - Conversions between raw codes or names and `SliceTag`, and a `Display` implementation.
///
/// # Example
/// ```rust,ignore
/// use rimslice::define_slice_tags;
///
/// define_slice_tags! {
///     Unassigned => "unassigned", 0x00,
///     Root => "root", 0x02,
/// }
/// ```
///
/// # Parameters
/// - `$name`: Identifier for the tag (used for enum variant and function/constant names).
/// - `$desc`: Description string for the tag.
/// - `$code`: Raw VTOC tag value.
///
/// # Generated Items
/// For each tag:
/// - `pub const V_<NAME>: u16`
/// - `pub fn is_<name>_slice(slot: &Slot) -> bool`
///
/// Also generates:
/// - `pub enum SliceTag`
/// - Implementations for `from_raw`, `from_name`, `as_raw`, and `Display` for `SliceTag`.
///
/// # Note
/// This macro requires the `paste` crate for identifier concatenation.
macro_rules! define_slice_tags {
    (
        $(
            $name:ident => $desc:expr, $code:expr
        ),+ $(,)?
    ) => {
        paste::paste! {
            $(
                #[doc = $desc]
                pub const [<V_ $name:upper>]: u16 = $code;

                #[doc = concat!("Checks if a slot is tagged: ", $desc)]
                pub fn [<is_ $name:lower _slice>](
                    slot: &$crate::slot::Slot,
                ) -> bool {
                    slot.tag == SliceTag::$name
                }
            )+

            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum SliceTag {
                $($name,)+
                Unknown(u16),
            }

            impl SliceTag {
                pub fn from_raw(code: u16) -> Self {
                    match code {
                        $(c if c == [<V_ $name:upper>] => Self::$name,)+
                        other => Self::Unknown(other),
                    }
                }

                /// Looks a tag up by its name, ignoring case.
                pub fn from_name(name: &str) -> Option<Self> {
                    $(
                        if name.eq_ignore_ascii_case($desc) {
                            return Some(Self::$name);
                        }
                    )+
                    None
                }

                pub fn as_raw(&self) -> u16 {
                    match self {
                        $(Self::$name => [<V_ $name:upper>],)+
                        Self::Unknown(code) => *code,
                    }
                }
            }

            impl core::fmt::Display for SliceTag {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    match self {
                        $(Self::$name => write!(f, $desc),)+
                        Self::Unknown(code) => write!(f, "unknown ({:#04x})", code),
                    }
                }
            }
        }
    };
}
