use std::fmt;

/// The built-in scalar types.
///
/// A reference whose name is one of these keywords always resolves to the scalar, no matter what
/// the document declares.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scalar {
    U8,
    U16,
    U32,
    U64,
    S8,
    S16,
    S32,
    S64,
    F32,
    F64,
    Bool,
    Char,
    String,
}

impl Scalar {
    pub const ALL: [Scalar; 13] = [
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::S8,
        Self::S16,
        Self::S32,
        Self::S64,
        Self::F32,
        Self::F64,
        Self::Bool,
        Self::Char,
        Self::String,
    ];

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::S8 => "s8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::S64 => "s64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Bool => "bool",
            Self::Char => "char",
            Self::String => "string",
        }
    }

    /// Looks up a scalar by keyword. Keywords are case-insensitive, like every other keyword of
    /// the grammar.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|scalar| scalar.keyword().eq_ignore_ascii_case(keyword))
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
                | Self::S8
                | Self::S16
                | Self::S32
                | Self::S64
        )
    }

    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Self::S8 | Self::S16 | Self::S32 | Self::S64 | Self::F32 | Self::F64
        )
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Width in bits of the numeric scalars; `None` for `bool`, `char` and `string`.
    pub const fn bit_width(self) -> Option<u32> {
        match self {
            Self::U8 | Self::S8 => Some(8),
            Self::U16 | Self::S16 => Some(16),
            Self::U32 | Self::S32 | Self::F32 => Some(32),
            Self::U64 | Self::S64 | Self::F64 => Some(64),
            Self::Bool | Self::Char | Self::String => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_keyword_maps_back_to_its_scalar() {
        for scalar in Scalar::ALL {
            assert_eq!(Scalar::from_keyword(scalar.keyword()), Some(scalar));
        }
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(Scalar::from_keyword("U32"), Some(Scalar::U32));
        assert_eq!(Scalar::from_keyword("String"), Some(Scalar::String));
        assert_eq!(Scalar::from_keyword("u128"), None);
        assert_eq!(Scalar::from_keyword("strings"), None);
    }

    #[test]
    fn numeric_classification() {
        assert!(Scalar::S16.is_integer() && Scalar::S16.is_signed());
        assert!(Scalar::U64.is_integer() && !Scalar::U64.is_signed());
        assert!(Scalar::F32.is_float() && !Scalar::F32.is_integer());
        assert!(!Scalar::Char.is_integer() && !Scalar::Char.is_float());
        assert_eq!(Scalar::F64.bit_width(), Some(64));
        assert_eq!(Scalar::Bool.bit_width(), None);
    }

    #[test]
    fn display_is_the_lower_case_keyword() {
        assert_eq!(Scalar::String.to_string(), "string");
        assert_eq!(Scalar::S8.to_string(), "s8");
    }
}
