use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Specialization {
    Cardiology => "cardiology",
    Neurology => "neurology",
    Orthopedics => "orthopedics",
    Pediatrics => "pediatrics",
    Psychiatry => "psychiatry",
    Dermatology => "dermatology",
    Oncology => "oncology",
    GeneralMedicine => "general_medicine",
    EmergencyMedicine => "emergency_medicine",
    InternalMedicine => "internal_medicine",
});

str_enum!(AppRole {
    Admin => "admin",
    Doctor => "doctor",
    Patient => "patient",
});

impl Specialization {
    /// Human-readable label ("general_medicine" → "general medicine").
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

/// Recommendation priority as reported by the ranking oracle.
///
/// Parsed case-insensitively; anything else is treated as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn parse_lenient(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}
