//! UDP transport for the relay
//!
//! Each category owns two independent endpoints: publish-in, and
//! subscribe-in which doubles as notify-out. Receives are non-blocking and
//! drained eagerly; the only transport failure that is retried is the
//! "socket no longer usable" class, which is recovered by rebinding the
//! endpoint in place.

pub mod dispatcher;
pub mod endpoint;
pub mod wire;

pub use dispatcher::Dispatcher;
pub use endpoint::Endpoint;

use std::io;

/// The failure class that warrants rebuilding the socket and retrying
///
/// Everything else aborts the current operation only.
pub(crate) fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotConnected | io::ErrorKind::BrokenPipe
    )
}
