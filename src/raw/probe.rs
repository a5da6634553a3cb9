use crate::key::Key;

// Jenkins's one-at-a-time hash over the key's stored bytes, reduced modulo
// the table capacity to select the home slot.
//
// Deterministic for identical `(key, capacity)` pairs; makes no attempt at
// collision resistance.
pub(crate) fn home_index(key: &Key, capacity: usize) -> usize {
    let mut hash: u32 = 0;

    for &byte in key.as_bytes() {
        hash = hash.wrapping_add(byte as u32);
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }

    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash = hash.wrapping_add(hash << 15);

    hash as usize % capacity
}

// A linear probe sequence.
//
// Walks consecutive slots starting at the key's home index, wrapping at the
// end of the table, visiting at most `capacity` slots.
pub(crate) struct Probe {
    // The current slot index.
    pub i: usize,
    // The number of slots visited so far.
    pub len: usize,
    // The number of slots in the table.
    capacity: usize,
}

impl Probe {
    // Initialize the probe sequence at the key's home slot.
    pub fn start(key: &Key, capacity: usize) -> Probe {
        Probe {
            i: home_index(key, capacity),
            len: 0,
            capacity,
        }
    }

    // Advance to the next slot in the sequence.
    pub fn next(&mut self) {
        self.len += 1;
        self.i += 1;

        if self.i == self.capacity {
            self.i = 0;
        }
    }

    // Returns `true` once every slot has been visited.
    pub fn exhausted(&self) -> bool {
        self.len >= self.capacity
    }
}
