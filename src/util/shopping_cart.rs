use std::collections::HashMap;

use crate::db::CartEntry;

pub const HEADER: &str = "Shopping list:";

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Sums amounts per (name, unit), keeping the order in which each pair was
/// first seen.
pub fn aggregate(entries: impl IntoIterator<Item = CartEntry>) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for entry in entries {
        let key = (entry.name, entry.measurement_unit);
        match index.get(&key) {
            Some(&i) => lines[i].amount += entry.amount,
            None => {
                index.insert(key.clone(), lines.len());
                lines.push(CartLine {
                    name: key.0,
                    measurement_unit: key.1,
                    amount: entry.amount,
                });
            }
        }
    }

    lines
}

pub fn render(lines: &[CartLine]) -> String {
    let mut out = format!("{}\n\n", HEADER);
    for line in lines {
        out.push_str(&format!(
            "\t\u{2022} {} ({}) - {}\n",
            line.name, line.measurement_unit, line.amount
        ));
    }
    out
}
