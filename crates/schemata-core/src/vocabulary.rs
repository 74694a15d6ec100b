//! Closed value sets of the REST capability vocabulary
//!
//! These are plain data: schemas list the same strings in their `enum`
//! keywords, and the validator never consults this module. Each type
//! round-trips through its wire spelling with `FromStr`, `Display` and serde.
//!
//! Copyright (c) 2025 Schemata Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A string outside a closed value set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{value}' is not a valid {set} value")]
pub struct UnknownValue {
    pub set: &'static str,
    pub value: String,
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every value in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// Wire spelling
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// Wire spellings in declaration order
            pub fn values() -> impl Iterator<Item = &'static str> {
                Self::ALL.iter().map(|value| value.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(UnknownValue {
                        set: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

vocabulary! {
    /// Lifecycle status of a published artifact
    PublicationStatus {
        Draft => "draft",
        Active => "active",
        Retired => "retired",
        Unknown => "unknown",
    }
}

vocabulary! {
    /// How a capability statement is intended to be used
    CapabilityStatementKind {
        /// Describes an actual running installation
        Instance => "instance",
        /// Describes a software product
        Capability => "capability",
        /// Describes a desired set of capabilities
        Requirements => "requirements",
    }
}

vocabulary! {
    /// Whether a REST description applies to a client or a server
    RestfulCapabilityMode {
        Client => "client",
        Server => "server",
    }
}

vocabulary! {
    /// Operations supported on a resource type
    TypeRestfulInteraction {
        Read => "read",
        Vread => "vread",
        Update => "update",
        Patch => "patch",
        Delete => "delete",
        HistoryInstance => "history-instance",
        HistoryType => "history-type",
        Create => "create",
        SearchType => "search-type",
    }
}

vocabulary! {
    /// Operations supported at the system level
    SystemRestfulInteraction {
        Transaction => "transaction",
        Batch => "batch",
        SearchSystem => "search-system",
        HistorySystem => "history-system",
    }
}

vocabulary! {
    /// How a server tracks resource versions
    ResourceVersionPolicy {
        NoVersion => "no-version",
        Versioned => "versioned",
        VersionedUpdate => "versioned-update",
    }
}

vocabulary! {
    /// Support for conditional reads
    ConditionalReadStatus {
        NotSupported => "not-supported",
        ModifiedSince => "modified-since",
        NotMatch => "not-match",
        FullSupport => "full-support",
    }
}

vocabulary! {
    /// Support for conditional deletes
    ConditionalDeleteStatus {
        NotSupported => "not-supported",
        Single => "single",
        Multiple => "multiple",
    }
}

vocabulary! {
    /// How a server handles references between resources
    ReferenceHandlingPolicy {
        Literal => "literal",
        Logical => "logical",
        Resolves => "resolves",
        Enforced => "enforced",
        Local => "local",
    }
}

vocabulary! {
    /// Data type of a search parameter
    SearchParamType {
        Number => "number",
        Date => "date",
        String => "string",
        Token => "token",
        Reference => "reference",
        Composite => "composite",
        Quantity => "quantity",
        Uri => "uri",
        Special => "special",
    }
}
