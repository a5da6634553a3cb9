use serde::de::{Error as _, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use std::fmt::{self, Formatter};
use std::marker::PhantomData;

use crate::Table;

struct TableVisitor<V> {
    _marker: PhantomData<Table<V>>,
}

impl<V> Serialize for Table<V>
where
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Claimed-but-unpopulated slots have no value to serialize and are
        // skipped; keys are rendered as (lossy) UTF-8 strings.
        serializer.collect_map(self.iter().filter_map(|(key, value)| {
            Some((String::from_utf8_lossy(key.as_bytes()), value?))
        }))
    }
}

impl<'de, V> Deserialize<'de> for Table<V>
where
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(TableVisitor {
            _marker: PhantomData,
        })
    }
}

impl<'de, V> Visitor<'de> for TableVisitor<V>
where
    V: Deserialize<'de>,
{
    type Value = Table<V>;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "a map")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut table = Table::new().map_err(M::Error::custom)?;

        while let Some((key, value)) = access.next_entry::<String, V>()? {
            table.insert(key, value).map_err(M::Error::custom)?;
        }

        Ok(table)
    }
}
