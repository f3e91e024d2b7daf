//! Serde helpers for token amounts.
//!
//! Amounts are written as decimal strings and read from either a decimal string or a
//! JSON integer. Strings keep full `u128` precision through tagged enums, which buffer
//! their content and cannot hold 128-bit integers.

use crate::Amount;
use serde::{de, Deserializer, Serializer};
use std::fmt;

pub fn serialize<S>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(amount)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(AmountVisitor)
}

struct AmountVisitor;

impl de::Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(v as Amount)
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Amount::try_from(v).map_err(|_| E::custom(format!("negative amount: {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        v.trim()
            .parse::<Amount>()
            .map_err(|_| E::custom(format!("invalid amount: {v}")))
    }
}

/// Same encoding for `Option<Amount>`; `None` is `null`.
pub mod option {
    use super::AmountVisitor;
    use crate::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(amount: &Option<Amount>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match amount {
            Some(amount) => serializer.collect_str(amount),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Amount>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wrapped(#[serde(deserialize_with = "deserialize_inner")] Amount);

        fn deserialize_inner<'de, D>(deserializer: D) -> Result<Amount, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(AmountVisitor)
        }

        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(amount)| amount))
    }
}
