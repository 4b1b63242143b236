use std::io::{self, Write};

use super::types::DataStore;

/// Giver / recipient columns for everyone with a gift recorded in `year`.
pub fn gift_report(store: &DataStore, year: i32, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{year}")?;
    writeln!(out, "{:<15}  {}", "giver", "recipient")?;
    for (_, p) in store.people() {
        if let Some(r) = p.recipient(year) {
            writeln!(out, "{:<15}  {}", p.name, r)?;
        }
    }
    Ok(())
}
