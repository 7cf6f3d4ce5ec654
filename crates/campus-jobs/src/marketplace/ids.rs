use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Allocates the next process-unique identifier.
            pub fn generate() -> Self {
                static SEQUENCE: AtomicU64 = AtomicU64::new(1);
                let id = SEQUENCE.fetch_add(1, Ordering::Relaxed);
                Self(format!(concat!($prefix, "-{:06}"), id))
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
    };
}

identifier!(
    /// Identifier for registered students and employers.
    UserId,
    "usr"
);
identifier!(
    /// Identifier for employer organizations.
    CompanyId,
    "cmp"
);
identifier!(
    /// Identifier for job postings.
    JobId,
    "job"
);
identifier!(
    /// Identifier for submitted applications.
    ApplicationId,
    "app"
);
