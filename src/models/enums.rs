use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

str_enum!(DocumentStatus {
    Pending => "pending",
    Processing => "processing",
    Analyzed => "analyzed",
    Failed => "failed",
});

impl Gender {
    /// Map the gender text extracted from a note onto a stored gender.
    ///
    /// Absent or blank text falls back to Male, the layout's default;
    /// any present value that is neither feminine nor masculine maps to Other.
    pub fn from_extracted(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Gender::Male;
        };
        match value.to_lowercase().as_str() {
            "femenino" | "f" => Gender::Female,
            "masculino" | "m" => Gender::Male,
            _ => Gender::Other,
        }
    }
}
