pub mod attribute;
pub mod category;
pub mod media;
pub mod pricing;
pub mod product;

pub use attribute::{Attribute, AttributeType, ProductAttribute, ProductAttributeValue};
pub use category::{Category, CategoryNode, SeoData};
pub use media::{Media, MediaType};
pub use pricing::{PriceRecord, PriceType};
pub use product::{Product, ProductDetail};

/// Implements the string representation and sqlx TEXT-column mapping for a
/// closed "type" enum (price type, media type, attribute type).
///
/// The original data model kept these as free-form strings; here unknown
/// values are rejected at the boundary so a typo cannot silently create a
/// new category of behavior. Extending the set means adding a variant.
macro_rules! text_enum {
    ($ty:ident, $err:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        #[error("unknown {kind}: {0}", kind = $label)]
        pub struct $err(pub String);

        impl core::str::FromStr for $ty {
            type Err = $err;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err($err(other.to_string())),
                }
            }
        }

        impl core::fmt::Display for $ty {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <&str as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(s.parse::<$ty>()?)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                let s = self.as_str();
                <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&s, buf)
            }
        }
    };
}

pub(crate) use text_enum;
