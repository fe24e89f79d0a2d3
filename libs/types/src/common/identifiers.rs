//! # Typed Identifiers
//!
//! Zero-cost wrappers that keep order ids, pool ids and account addresses from
//! being confused with each other or with raw amounts.
//!
//! ```rust
//! use twamm_types::{Address, Direction, OrderId};
//!
//! let owner: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
//! let order = OrderId::new(0);
//! assert_eq!(order.next(), Some(OrderId::new(1)));
//! assert_eq!(Direction::ZeroToOne.sold().index(), 0);
//! assert!(!owner.is_null());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro for generating typed `u64` identifiers
#[macro_export]
macro_rules! define_typed_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline(always)]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            #[inline(always)]
            pub const fn inner(&self) -> u64 {
                self.0
            }

            /// Next sequential id, `None` once the id space is exhausted
            #[inline(always)]
            pub fn next(&self) -> Option<Self> {
                self.0.checked_add(1).map(Self)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<u64> for $name {
            #[inline(always)]
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            #[inline(always)]
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                self.0.serialize(serializer)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                u64::deserialize(deserializer).map(Self)
            }
        }
    };
}

define_typed_id!(
    /// Long-term order identifier, assigned monotonically per pool
    OrderId
);

define_typed_id!(
    /// Pool identifier within a registry
    PoolId
);

/// 20-byte account address of an order owner, delegate, LP holder or fee recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Holder of the permanently locked bootstrap liquidity
    pub const NULL: Self = Self([0u8; 20]);

    #[inline(always)]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Convenience constructor for tests and simulations: last byte set to `tag`
    pub const fn from_low_byte(tag: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[19] = tag;
        Self(bytes)
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One of the two pooled assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Token0,
    Token1,
}

impl Asset {
    pub const ALL: [Asset; 2] = [Asset::Token0, Asset::Token1];

    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Asset::Token0 => 0,
            Asset::Token1 => 1,
        }
    }

    pub const fn other(self) -> Asset {
        match self {
            Asset::Token0 => Asset::Token1,
            Asset::Token1 => Asset::Token0,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Token0 => write!(f, "token0"),
            Asset::Token1 => write!(f, "token1"),
        }
    }
}

/// Trade direction, named by the asset sold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    ZeroToOne,
    OneToZero,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::ZeroToOne, Direction::OneToZero];

    /// Asset flowing into the pool
    pub const fn sold(self) -> Asset {
        match self {
            Direction::ZeroToOne => Asset::Token0,
            Direction::OneToZero => Asset::Token1,
        }
    }

    /// Asset flowing out of the pool
    pub const fn bought(self) -> Asset {
        self.sold().other()
    }

    /// Index into per-direction arrays; equal to the sold asset's index
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.sold().index()
    }
}
