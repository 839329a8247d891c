//! Journal sink: writes `<N>message\n` lines to a pre-opened datagram fd
//! (spec §4.5). Grounded on the pack's `UnixDatagram`-based socket sink
//! (`libdd-dogstatsd-client`), simplified from a full syslog wire format
//! down to the spec's 3-byte severity prefix.

use std::io::Write;
use std::os::fd::{FromRawFd, RawFd};

use crate::severity::Severity;

use super::LineEvent;

pub struct JournalSink {
    fd: RawFd,
    ceiling: Severity,
}

impl JournalSink {
    #[must_use]
    pub fn new(fd: RawFd, ceiling: Severity) -> Self {
        JournalSink { fd, ceiling }
    }

    pub fn write_complete(&mut self, event: &LineEvent<'_>) -> std::io::Result<()> {
        if !event.severity.passes_ceiling(self.ceiling) {
            return Ok(());
        }
        let datagram = unsafe { std::os::unix::net::UnixDatagram::from_raw_fd(self.fd) };
        let mut buf = Vec::with_capacity(event.text.len() + 8);
        write!(buf, "<{}>", event.severity.as_u8())?;
        buf.extend_from_slice(event.text);
        let result = datagram.send(&buf).map(|_| ());
        std::mem::forget(datagram); // caller owns the fd's lifetime
        result
    }
}
