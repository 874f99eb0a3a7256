// JSON emission to the report's output stream.

use std::io::Write;

use serde::Serialize;

/// Write `value` as pretty-printed JSON followed by a newline.
pub fn emit<T, W>(value: &T, mut out: W) -> std::io::Result<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    out.flush()
}
