#![allow(dead_code)]

use openhash::Table;

// Run the test against tables with different starting capacities.
pub fn with_table<V>(mut test: impl FnMut(Table<V>)) {
    // The default capacity.
    test(Table::new().unwrap());

    // A larger table, so the same operations run without triggering growth.
    test(Table::with_capacity(256).unwrap());
}

// Sequentially numbered keys "k0".."k{n-1}".
pub fn keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("k{i}")).collect()
}

// The live keys of a table, in slot order.
pub fn live_keys<V>(table: &Table<V>) -> Vec<String> {
    table.iter().map(|(key, _)| key.to_string()).collect()
}
