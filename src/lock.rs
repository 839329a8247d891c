//! Open-file-description locks over the log file, with fallback to legacy
//! POSIX advisory locks (spec §4.3), grounded on the pack's `FLock` helper
//! (`ddtelemetry/src/ipc/platform/unix/locks.rs`), generalized from "one
//! exclusive lock per process lifetime" to "shared while writing, briefly
//! exclusive during rotation".

use std::os::fd::RawFd;

use nix::fcntl::FcntlArg;
use nix::libc;

/// Which lock flavor a successful acquisition used. Once a process learns
/// the kernel rejects OFD locks (`EINVAL`), it sticks to the legacy flavor
/// for the rest of its life to avoid re-probing on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Ofd,
    Legacy,
}

/// Tracks which lock API to use for a given `RawFd`. A shared lock is held
/// on `fd` for the entire lifetime of a writer; rotation upgrades it to
/// exclusive and downgrades back.
#[derive(Debug)]
pub struct FileLock {
    fd: RawFd,
    flavor: Flavor,
}

impl FileLock {
    /// Acquires the initial shared lock held for the writer's lifetime.
    pub fn acquire_shared(fd: RawFd) -> std::io::Result<Self> {
        let flavor = try_ofd(fd, libc::F_RDLCK)?;
        Ok(FileLock { fd, flavor })
    }

    /// Upgrades to an exclusive lock for the duration of rotation.
    pub fn upgrade_exclusive(&mut self) -> std::io::Result<()> {
        set_lock(self.fd, self.flavor, libc::F_WRLCK)
    }

    /// Downgrades back to the steady-state shared lock.
    pub fn downgrade_shared(&mut self) -> std::io::Result<()> {
        set_lock(self.fd, self.flavor, libc::F_RDLCK)
    }
}

/// Tries an OFD lock first; on `EINVAL` (kernel too old / fs doesn't
/// support them) retries once with the legacy POSIX lock and remembers the
/// choice. OFD locks are Linux-only; other unix platforms go straight to
/// the legacy flavor.
fn try_ofd(fd: RawFd, lock_type: i32) -> std::io::Result<Flavor> {
    #[cfg(target_os = "linux")]
    {
        let flock = raw_flock(lock_type);
        let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(fd) };
        match nix::fcntl::fcntl(borrowed, FcntlArg::F_OFD_SETLKW(&flock)) {
            Ok(_) => return Ok(Flavor::Ofd),
            Err(nix::errno::Errno::EINVAL) => {}
            Err(e) => return Err(e.into()),
        }
    }
    set_legacy(fd, lock_type)?;
    Ok(Flavor::Legacy)
}

fn set_lock(fd: RawFd, flavor: Flavor, lock_type: i32) -> std::io::Result<()> {
    match flavor {
        #[cfg(target_os = "linux")]
        Flavor::Ofd => {
            let flock = raw_flock(lock_type);
            let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(fd) };
            nix::fcntl::fcntl(borrowed, FcntlArg::F_OFD_SETLKW(&flock)).map(|_| ())?;
            Ok(())
        }
        #[cfg(not(target_os = "linux"))]
        Flavor::Ofd => unreachable!("OFD locks are only acquired on linux"),
        Flavor::Legacy => set_legacy(fd, lock_type),
    }
}

fn set_legacy(fd: RawFd, lock_type: i32) -> std::io::Result<()> {
    let flock = raw_flock(lock_type);
    let borrowed = unsafe { std::os::fd::BorrowedFd::borrow_raw(fd) };
    nix::fcntl::fcntl(borrowed, FcntlArg::F_SETLKW(&flock))
        .map(|_| ())
        .map_err(std::io::Error::from)
}

fn raw_flock(lock_type: i32) -> libc::flock {
    libc::flock {
        l_type: lock_type as libc::c_short,
        l_whence: libc::SEEK_SET as libc::c_short,
        l_start: 0,
        l_len: 0,
        l_pid: 0,
    }
}
