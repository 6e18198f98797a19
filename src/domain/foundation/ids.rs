//! Identifier newtypes over random UUIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// One incoming query and everything logged against it.
    QueryId
);

uuid_id!(
    /// A stored few-shot example.
    ExampleId
);

uuid_id!(
    /// A single tool call made while answering a query.
    InvocationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_differ() {
        assert_ne!(QueryId::new(), QueryId::new());
        assert_ne!(InvocationId::new(), InvocationId::new());
    }

    #[test]
    fn display_output_parses_back() {
        let id = QueryId::new();
        assert_eq!(id.to_string().parse::<QueryId>().unwrap(), id);
        assert!("not-a-uuid".parse::<ExampleId>().is_err());
    }

    #[test]
    fn serialized_as_bare_uuid_string() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&ExampleId::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
        assert_eq!(ExampleId::from_uuid(uuid).as_uuid(), &uuid);
    }
}
