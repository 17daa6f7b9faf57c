//! Stdout helpers that stop quietly when the reader goes away.
//!
//! Listings are often piped into `head` or `grep -m1`; once the pipe closes
//! the command returns `Ok(())` instead of reporting an error.

/// Print with newline, returning `Ok(())` from the caller on BrokenPipe.
macro_rules! print_line {
    ($($arg:tt)*) => {{
        use std::io::Write;
        match writeln!(std::io::stdout(), $($arg)*) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }};
}

pub(crate) use print_line;

/// Copy `reader` to stdout, treating a closed pipe as success
pub fn copy_to_stdout(reader: &mut dyn std::io::Read) -> std::io::Result<u64> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    match std::io::copy(reader, &mut handle) {
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(0),
        other => other,
    }
}
