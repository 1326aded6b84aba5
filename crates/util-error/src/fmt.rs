// SPDX-License-Identifier: MIT

use std::error::Error;
use std::fmt;

/// Render an error together with its whole `source()` chain on a single line
///
/// Meant for structured log fields, where multi-line reports are unwelcome.
pub trait FmtCompact {
    fn fmt_compact(&self) -> FmtCompactDisplay<'_>;
}

impl<E> FmtCompact for E
where
    E: Error,
{
    fn fmt_compact(&self) -> FmtCompactDisplay<'_> {
        FmtCompactDisplay(self)
    }
}

pub struct FmtCompactDisplay<'e>(&'e dyn Error);

impl fmt::Display for FmtCompactDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.0, f)?;

        let mut source = self.0.source();
        while let Some(err) = source {
            f.write_str(": ")?;
            fmt::Display::fmt(err, f)?;
            source = err.source();
        }
        Ok(())
    }
}
