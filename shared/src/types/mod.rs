//! Core types used throughout the quoting system

use crate::errors::{SharedError, SharedResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

pub mod member;
pub mod plan;

pub use member::{IncomeComponents, Member, MemberSnapshot};
pub use plan::{County, Plan, PricingRow};

/// Global service ID singleton - set once at startup
static SERVICE_ID: OnceLock<ServiceId> = OnceLock::new();

/// Identifier for the running binary, attached to every log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceId {
    /// Offline batch runner
    Engine,
    /// HTTP surface
    WebServer,
    /// Resolution client
    Client,
    /// Library code running without an initialized binary (tests, embedding)
    Library,
}

impl ServiceId {
    pub fn init_engine() -> &'static ServiceId {
        SERVICE_ID.get_or_init(|| ServiceId::Engine)
    }

    pub fn init_webserver() -> &'static ServiceId {
        SERVICE_ID.get_or_init(|| ServiceId::WebServer)
    }

    pub fn init_client() -> &'static ServiceId {
        SERVICE_ID.get_or_init(|| ServiceId::Client)
    }

    /// Get the global service ID, or `Library` when no binary initialized it
    pub fn current() -> &'static ServiceId {
        SERVICE_ID.get().unwrap_or(&ServiceId::Library)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceId::Engine => write!(f, "engine"),
            ServiceId::WebServer => write!(f, "webserver"),
            ServiceId::Client => write!(f, "client"),
            ServiceId::Library => write!(f, "lib"),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Employer group identifier
    GroupId
);
string_id!(
    /// Member identifier, unique within the member directory
    MemberId
);
string_id!(
    /// Rating county identifier (county FIPS code in the reference data)
    CountyId
);
string_id!(
    /// Plan identifier (HIOS id in the reference data)
    PlanId
);

/// Canonical five-digit, zero-padded ZIP code.
///
/// Every boundary (member records, reference data, request bodies) goes
/// through [`ZipCode::parse`], so `"02134"`, `"2134"`, `2134` and
/// `"02134-1234"` all compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZipCode(String);

impl ZipCode {
    pub fn parse(input: &str) -> SharedResult<Self> {
        let invalid = || SharedError::InvalidZipCode {
            input: input.to_string(),
        };

        let trimmed = input.trim();
        let base = match trimmed.split_once('-') {
            Some((base, plus4)) => {
                if plus4.len() != 4 || !plus4.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                base
            }
            None => trimmed,
        };

        if base.is_empty() || !base.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        match base.len() {
            1..=5 => Ok(Self(format!("{base:0>5}"))),
            // ZIP+4 written without the dash
            9 if base == trimmed => Ok(Self(base[..5].to_string())),
            _ => Err(invalid()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ZipCode {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ZipCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawZip {
    Text(String),
    Number(u64),
}

impl RawZip {
    fn into_text(self) -> String {
        match self {
            RawZip::Text(text) => text,
            RawZip::Number(number) => number.to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for ZipCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawZip::deserialize(deserializer)?.into_text();
        ZipCode::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// ZIP code as recorded on a member.
///
/// Member records come from outside this system, so a malformed value is
/// kept as written instead of failing the whole directory; the member is
/// then skipped on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MemberZip {
    #[default]
    Missing,
    Valid(ZipCode),
    Invalid(String),
}

impl MemberZip {
    /// Blank means missing
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return MemberZip::Missing;
        }
        match ZipCode::parse(trimmed) {
            Ok(zip_code) => MemberZip::Valid(zip_code),
            Err(_) => MemberZip::Invalid(trimmed.to_string()),
        }
    }

    pub fn valid(&self) -> Option<&ZipCode> {
        match self {
            MemberZip::Valid(zip_code) => Some(zip_code),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, MemberZip::Missing)
    }
}

impl From<ZipCode> for MemberZip {
    fn from(zip_code: ZipCode) -> Self {
        MemberZip::Valid(zip_code)
    }
}

impl From<Option<ZipCode>> for MemberZip {
    fn from(zip_code: Option<ZipCode>) -> Self {
        zip_code.map_or(MemberZip::Missing, MemberZip::Valid)
    }
}

impl Serialize for MemberZip {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MemberZip::Missing => serializer.serialize_none(),
            MemberZip::Valid(zip_code) => serializer.serialize_str(zip_code.as_str()),
            MemberZip::Invalid(raw) => serializer.serialize_str(raw),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMemberZip {
    Zip(RawZip),
    Other(serde_json::Value),
}

impl<'de> Deserialize<'de> for MemberZip {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<RawMemberZip>::deserialize(deserializer)? {
            None => MemberZip::Missing,
            Some(RawMemberZip::Zip(raw)) => MemberZip::from_raw(&raw.into_text()),
            Some(RawMemberZip::Other(value)) => MemberZip::Invalid(value.to_string()),
        })
    }
}
