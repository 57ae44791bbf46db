//! Profile data models and the enumerated `users` columns.

use super::errors::{ProfileError, ProfileResult};
use crate::validation;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Largest accepted profile picture (5 MiB)
pub const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted profile picture MIME types
pub const ALLOWED_PICTURE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Enum stored as text in a `users` column, spelled exactly as in the column.
macro_rules! column_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ProfileError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err(ProfileError::InvalidValue {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

column_enum! {
    Gender, "gender" {
        Male => "male",
        Female => "female",
        #[default]
        Other => "other",
    }
}

column_enum! {
    /// Favourite avatar, one of the arcade's character portraits
    Avatar, "favAvatar" {
        #[default]
        None => "None",
        QueenOfTheSpoons => "QueenOfTheSpoons",
        JustBorn => "JustBorn",
        Maslina => "Maslina",
        BossLady => "BossLady",
        Inka => "Inka",
        Burek => "Burek",
        Fish => "Fish",
        WarMachine => "WarMachine",
        Finn => "Finn",
        GangGanger => "GangGanger",
        StabIlity => "StabIlity",
        VampBoy => "VampBoy",
    }
}

column_enum! {
    Language, "language" {
        #[default]
        English => "english",
        Serbian => "serbian",
        Finnish => "finnish",
        Russian => "russian",
    }
}

column_enum! {
    OnlineStatus, "online_status" {
        #[default]
        Offline => "offline",
        Online => "online",
    }
}

column_enum! {
    /// How the account signs in
    AuthProvider, "auth_provider" {
        #[default]
        Email => "email",
        Google => "google",
    }
}

/// Profile as shown to players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub email: String,
    pub profile_pic: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Gender,
    pub date_of_birth: Option<String>,
    pub wins: i64,
    pub losses: i64,
    pub language: Language,
    pub fav_avatar: Avatar,
}

/// Leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub wins: i64,
    pub losses: i64,
}

/// Body of `PATCH /update-field/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFieldRequest {
    pub field: String,
    pub value: String,
}

/// Profile fields a player may edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    FirstName,
    LastName,
    Gender,
    DateOfBirth,
    Language,
    FavAvatar,
}

impl ProfileField {
    /// Column backing this field
    pub fn column(&self) -> &'static str {
        match self {
            ProfileField::FirstName => "first_name",
            ProfileField::LastName => "last_name",
            ProfileField::Gender => "gender",
            ProfileField::DateOfBirth => "date_of_birth",
            ProfileField::Language => "language",
            ProfileField::FavAvatar => "fav_avatar",
        }
    }

    /// Check `value` against the rules of this field.
    pub fn validate(&self, value: &str) -> ProfileResult<()> {
        match self {
            ProfileField::FirstName | ProfileField::LastName => {
                if !validation::is_valid_name(value) {
                    return Err(ProfileError::InvalidName);
                }
            }
            ProfileField::DateOfBirth => {
                if !validation::is_valid_date(value) {
                    return Err(ProfileError::InvalidDate);
                }
            }
            ProfileField::Gender => {
                value.parse::<Gender>()?;
            }
            ProfileField::Language => {
                value.parse::<Language>()?;
            }
            ProfileField::FavAvatar => {
                value.parse::<Avatar>()?;
            }
        }
        Ok(())
    }
}

impl FromStr for ProfileField {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "firstName" => Ok(ProfileField::FirstName),
            "lastName" => Ok(ProfileField::LastName),
            "gender" => Ok(ProfileField::Gender),
            "dateOfBirth" => Ok(ProfileField::DateOfBirth),
            "language" => Ok(ProfileField::Language),
            "favAvatar" => Ok(ProfileField::FavAvatar),
            _ => Err(ProfileError::FieldNotAllowed),
        }
    }
}

/// File extension for an accepted picture type
pub(crate) fn picture_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}
