use displaydoc::Display;

/// Errors surfaced by the mouse driver.
///
/// Poll timeouts are not in here: the wait loops log and proceed, and
/// packet overflow is a silent discard. Only the command protocol has a
/// caller with something to do about a failure.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum MouseError {
    /// mouse never acknowledged command {0:#04x}
    AckTimeout(u8),
}
