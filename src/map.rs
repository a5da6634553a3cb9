use std::fmt;

use crate::error::Result;
use crate::key::Key;
use crate::raw::RawTable;

/// A fixed-key open-addressing hash table.
///
/// Values of type `V` are keyed by short bounded strings ([`Key`]).
/// Collisions are resolved by linear probing, deletions leave tombstones
/// behind, and the table grows and shrinks automatically as load crosses
/// the 80% and 10% thresholds. See the [crate-level documentation](crate)
/// for details.
pub struct Table<V> {
    raw: RawTable<V>,
}

impl<V> Table<V> {
    /// Creates an empty table with the default capacity of
    /// [`MIN_CAPACITY`](crate::MIN_CAPACITY) slots.
    ///
    /// Fails only if the slot array cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```
    /// use openhash::Table;
    ///
    /// let table: Table<i32> = Table::new().unwrap();
    /// assert_eq!(table.capacity(), 40);
    /// ```
    pub fn new() -> Result<Table<V>> {
        Table::with_capacity(crate::raw::MIN_CAPACITY)
    }

    /// Creates an empty table with `capacity` slots, clamped to
    /// `[MIN_CAPACITY, MAX_CAPACITY]`.
    pub fn with_capacity(capacity: usize) -> Result<Table<V>> {
        let capacity = capacity.clamp(crate::raw::MIN_CAPACITY, crate::raw::MAX_CAPACITY);

        Ok(Table {
            raw: RawTable::with_capacity(capacity)?,
        })
    }

    /// Returns the current number of slots.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Returns the number of slots claimed since the last resize.
    ///
    /// Deletions do not decrement this counter: it measures slots touched
    /// since the last resize, not live entries, which also skews the
    /// shrink trigger (see the crate-level documentation). Use
    /// [`iter`](Table::iter) to count live entries.
    pub fn count(&self) -> usize {
        self.raw.count()
    }

    /// Returns a reference to the value stored for `key`.
    ///
    /// Returns `None` if the key is absent (a normal outcome, not an
    /// error) or if its slot was claimed through [`entry`](Table::entry)
    /// but never populated.
    ///
    /// # Examples
    ///
    /// ```
    /// use openhash::Table;
    ///
    /// let mut table = Table::new().unwrap();
    /// table.insert("bob", 1234).unwrap();
    ///
    /// assert_eq!(table.get("bob"), Some(&1234));
    /// assert_eq!(table.get("dave"), None);
    /// ```
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&V> {
        let key = Key::new(key);
        self.raw.value(self.raw.find(&key)?)
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut(&mut self, key: impl AsRef<[u8]>) -> Option<&mut V> {
        let key = Key::new(key);
        let i = self.raw.find(&key)?;
        self.raw.value_mut(i)
    }

    /// Returns `true` if a slot is claimed for `key`, populated or not.
    pub fn contains_key(&self, key: impl AsRef<[u8]>) -> bool {
        self.raw.find(&Key::new(key)).is_some()
    }

    /// Claims a slot for `key` and returns a handle to it.
    ///
    /// If the key is already present, the handle is occupied and exposes
    /// the stored value (the update path). Otherwise a fresh slot is
    /// claimed, reusing a tombstone when one sits on the key's probe
    /// chain, and the caller is expected to populate it via
    /// [`Entry::insert`].
    ///
    /// A new claim that pushes the table over 80% load triggers an inline
    /// doubling resize; the handle remains valid across it. Errors are
    /// limited to allocation failure during that resize and to a table
    /// with no open slot on the key's probe chain.
    ///
    /// # Examples
    ///
    /// ```
    /// use openhash::Table;
    ///
    /// let mut table = Table::new().unwrap();
    ///
    /// let mut entry = table.entry("bob").unwrap();
    /// assert!(!entry.is_occupied());
    /// entry.insert(1234);
    ///
    /// let entry = table.entry("bob").unwrap();
    /// assert!(entry.is_occupied());
    /// assert_eq!(entry.get(), Some(&1234));
    /// ```
    pub fn entry(&mut self, key: impl AsRef<[u8]>) -> Result<Entry<'_, V>> {
        let key = Key::new(key);
        let (mut index, existing) = self.raw.insert_key(key)?;

        // Growth is checked only for genuinely new claims, never updates.
        if !existing && self.raw.should_grow() {
            self.raw.resize(self.raw.grow_target())?;

            // Slot indices are stale after a resize.
            index = self
                .raw
                .find(&key)
                .expect("claimed key survives a resize");
        }

        Ok(Entry {
            raw: &mut self.raw,
            index,
        })
    }

    /// Inserts a value for `key`, returning the replaced value if the key
    /// was already present.
    ///
    /// # Examples
    ///
    /// ```
    /// use openhash::Table;
    ///
    /// let mut table = Table::new().unwrap();
    ///
    /// assert_eq!(table.insert("bob", 1).unwrap(), None);
    /// assert_eq!(table.insert("bob", 2).unwrap(), Some(1));
    /// ```
    pub fn insert(&mut self, key: impl AsRef<[u8]>, value: V) -> Result<Option<V>> {
        let mut entry = self.entry(key)?;
        Ok(entry.insert(value))
    }

    /// Removes the entry for `key`, handing its value back.
    ///
    /// Removing an absent key is a silent no-op. A removal that leaves the
    /// claimed-slot count under 10% of capacity triggers a best-effort
    /// halving resize; a failed shrink leaves the table valid.
    pub fn remove(&mut self, key: impl AsRef<[u8]>) -> Option<V> {
        let key = Key::new(key);
        let value = self.raw.remove(&key)?;

        if self.raw.should_shrink() {
            // Shrinking is opportunistic; the table stays valid either way.
            let _ = self.raw.resize(self.raw.shrink_target());
        }

        value
    }

    /// Removes every live entry.
    pub fn clear(&mut self) {
        let mut cursor = 0;

        while let Some(i) = self.raw.next_used(cursor) {
            let key = *self.raw.key(i);
            let capacity = self.raw.capacity();

            self.remove(key);

            // A shrink rehashes the survivors; restart the scan.
            cursor = if self.raw.capacity() == capacity { i } else { 0 };
        }
    }

    /// Returns the next live entry at or after `*cursor`, advancing the
    /// cursor past it.
    ///
    /// Entries come back in slot order, not insertion order, and cursors
    /// are invalidated by any resize. The value is `None` for a claimed
    /// slot that was never populated.
    ///
    /// # Examples
    ///
    /// ```
    /// use openhash::Table;
    ///
    /// let mut table = Table::new().unwrap();
    /// table.insert("bob", 1).unwrap();
    /// table.insert("dave", 2).unwrap();
    ///
    /// let mut seen = 0;
    /// let mut cursor = 0;
    /// while let Some((_key, value)) = table.next_entry(&mut cursor) {
    ///     assert!(value.is_some());
    ///     seen += 1;
    /// }
    /// assert_eq!(seen, 2);
    /// ```
    pub fn next_entry(&self, cursor: &mut usize) -> Option<(&Key, Option<&V>)> {
        let i = self.raw.next_used(*cursor)?;
        *cursor = i + 1;

        Some((self.raw.key(i), self.raw.value(i)))
    }

    /// Returns an iterator over the live entries, in slot order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            table: self,
            cursor: 0,
        }
    }

    /// Computes clustering statistics in one linear pass over the slots.
    pub fn stats(&self) -> Stats {
        self.raw.stats()
    }
}

impl<V: fmt::Debug> Table<V> {
    /// Returns a [`Display`](fmt::Display) adapter that prints a header
    /// and one line per used or tombstoned slot.
    pub fn dump(&self) -> Dump<'_, V> {
        Dump { table: self }
    }
}

impl<V: fmt::Debug> fmt::Debug for Table<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V: PartialEq> PartialEq for Table<V> {
    /// Tables are equal when they hold the same live entries, regardless
    /// of capacity or slot layout.
    fn eq(&self, other: &Table<V>) -> bool {
        if self.iter().count() != other.iter().count() {
            return false;
        }

        self.iter()
            .all(|(key, value)| other.contains_key(key) && other.get(key) == value)
    }
}

impl<V: Eq> Eq for Table<V> {}

impl<'a, V> IntoIterator for &'a Table<V> {
    type Item = (&'a Key, Option<&'a V>);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

/// A handle to a claimed slot, returned by [`Table::entry`].
///
/// The handle either exposes the existing value (update path) or an unset
/// value the caller must populate (insert path).
pub struct Entry<'a, V> {
    raw: &'a mut RawTable<V>,
    index: usize,
}

impl<V> Entry<'_, V> {
    /// Returns the slot's key.
    pub fn key(&self) -> &Key {
        self.raw.key(self.index)
    }

    /// Returns `true` if the slot already holds a value.
    pub fn is_occupied(&self) -> bool {
        self.raw.value(self.index).is_some()
    }

    /// Returns a reference to the stored value.
    pub fn get(&self) -> Option<&V> {
        self.raw.value(self.index)
    }

    /// Returns a mutable reference to the stored value.
    pub fn get_mut(&mut self) -> Option<&mut V> {
        self.raw.value_mut(self.index)
    }

    /// Stores a value in the slot, returning the previous one.
    pub fn insert(&mut self, value: V) -> Option<V> {
        self.raw.value_slot_mut(self.index).replace(value)
    }
}

/// An iterator over a table's live entries, in slot order.
///
/// Returned by [`Table::iter`].
pub struct Iter<'a, V> {
    table: &'a Table<V>,
    cursor: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a Key, Option<&'a V>);

    fn next(&mut self) -> Option<Self::Item> {
        self.table.next_entry(&mut self.cursor)
    }
}

/// Clustering statistics, computed by [`Table::stats`].
///
/// A run is a maximal contiguous block of non-empty (used or deleted)
/// slots. The scan is linear from slot 0 and does not wrap around the
/// array boundary, and the trailing run is flushed even when it is empty:
/// a table whose final slot is empty reports `min_run == 0`, and a fully
/// empty table reports zero for both bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// The number of tombstoned slots.
    pub deleted: usize,
    /// The length of the longest run.
    pub max_run: usize,
    /// The length of the shortest run.
    pub min_run: usize,
}

/// A human-readable dump of every slot, returned by [`Table::dump`].
pub struct Dump<'a, V> {
    table: &'a Table<V>,
}

impl<V: fmt::Debug> fmt::Display for Dump<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.table.raw.write_dump(f)
    }
}
