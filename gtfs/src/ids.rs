use serde::{Deserialize, Serialize};

// All of these wrap the original string IDs from the feed. They're kept as distinct types so a
// RouteID can't be passed where a StopID is expected.
macro_rules! string_id {
    ($name:ident) => {
        #[derive(
            Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(String);

        impl $name {
            pub fn new<S: Into<String>>(id: S) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(AgencyID);
string_id!(FareID);
string_id!(RouteID);
string_id!(ServiceID);
string_id!(ShapeID);
string_id!(StopID);
string_id!(TripID);

/// Generated when mining patterns; not part of the input data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PatternID(pub usize);

impl std::fmt::Display for PatternID {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "pattern {}", self.0)
    }
}
