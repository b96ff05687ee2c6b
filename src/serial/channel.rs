//! Raw serial channel to the MacroPad's USB CDC console
//!
//! The port is configured like `stty <baud> raw -echo`, drained of the
//! CircuitPython boot banner, and then switched to blocking writes. Reads are
//! always preceded by a zero-timeout poll so they never block.

use super::locator::DevicePath;
use crate::core::config::SerialConfig;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::termios::{
    cfmakeraw, cfsetspeed, tcgetattr, tcsetattr, BaudRate, ControlFlags, LocalFlags, SetArg,
};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Bytes requested per session read
const READ_CHUNK: usize = 256;

/// Bytes discarded per readable poll while draining
const DRAIN_CHUNK: usize = 4096;

/// Result of a non-blocking read
#[derive(Debug)]
pub enum ReadOutcome {
    /// Nothing to read right now; the link is still up
    NoData,
    Data(Vec<u8>),
    /// The peer hung up
    Closed,
    Error(io::Error),
}

/// Byte channel used by a session
pub trait Channel {
    /// Read whatever is available without blocking
    fn read_available(&mut self) -> ReadOutcome;

    /// Write all bytes, blocking until the OS accepts them
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Release the underlying handle. Calling this more than once is a no-op.
    fn close(&mut self);
}

#[derive(Debug, Error)]
#[error("failed to open {path:?}: {source}")]
pub struct OpenError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Open, configured serial port
#[derive(Debug)]
pub struct SerialChannel {
    path: DevicePath,
    file: Option<File>,
}

impl SerialChannel {
    /// Open and configure `path`, then discard anything the device sends
    /// within the drain window.
    pub fn open(path: &DevicePath, config: &SerialConfig) -> Result<Self, OpenError> {
        let wrap = |source: io::Error| OpenError {
            path: path.as_path().to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags((OFlag::O_NONBLOCK | OFlag::O_NOCTTY).bits())
            .open(path.as_path())
            .map_err(wrap)?;

        configure_line(&file, config.baud_rate).map_err(wrap)?;

        let drained = drain(&file, config.drain_window()).map_err(wrap)?;
        if drained > 0 {
            debug!("Discarded {} bytes of startup output from {}", drained, path);
        }

        // Writes block from here on; reads are guarded by poll.
        let fd = file.as_raw_fd();
        let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(|e| wrap(e.into()))?;
        let flags = OFlag::from_bits_truncate(flags) & !OFlag::O_NONBLOCK;
        fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(|e| wrap(e.into()))?;

        info!("Opened {} at {} baud", path, config.baud_rate);
        Ok(Self {
            path: path.clone(),
            file: Some(file),
        })
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl Channel for SerialChannel {
    fn read_available(&mut self) -> ReadOutcome {
        let Some(file) = self.file.as_mut() else {
            return ReadOutcome::Closed;
        };

        let revents = {
            let mut fds = [PollFd::new(file.as_fd(), PollFlags::POLLIN)];
            match poll(&mut fds, PollTimeout::ZERO) {
                Ok(0) => return ReadOutcome::NoData,
                Ok(_) => fds[0].revents().unwrap_or_else(PollFlags::empty),
                Err(nix::errno::Errno::EINTR) => return ReadOutcome::NoData,
                Err(e) => return ReadOutcome::Error(e.into()),
            }
        };

        if !revents.contains(PollFlags::POLLIN) {
            if revents.intersects(PollFlags::POLLERR | PollFlags::POLLNVAL) {
                return ReadOutcome::Error(io::Error::new(
                    io::ErrorKind::Other,
                    format!("poll reported {:?}", revents),
                ));
            }
            if revents.contains(PollFlags::POLLHUP) {
                return ReadOutcome::Closed;
            }
            return ReadOutcome::NoData;
        }

        let mut buf = [0u8; READ_CHUNK];
        match file.read(&mut buf) {
            Ok(0) => ReadOutcome::Closed,
            Ok(n) => ReadOutcome::Data(buf[..n].to_vec()),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => ReadOutcome::NoData,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => ReadOutcome::NoData,
            Err(e) => ReadOutcome::Error(e),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "channel is closed"))?;
        file.write_all(bytes)?;
        file.flush()
    }

    fn close(&mut self) {
        if let Some(file) = self.file.take() {
            // Dropping the File closes the descriptor; close errors on a
            // vanished device are ignored.
            drop(file);
            debug!("Closed {}", self.path);
        }
    }
}

impl Drop for SerialChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Raw mode, echo off, fixed speed, receiver enabled, modem lines ignored
fn configure_line(file: &File, baud_rate: u32) -> io::Result<()> {
    let baud = baud_rate_from(baud_rate).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported baud rate {}", baud_rate),
        )
    })?;

    let mut termios = tcgetattr(file)?;
    cfmakeraw(&mut termios);
    termios.local_flags &= !(LocalFlags::ECHO | LocalFlags::ECHONL);
    termios.control_flags |= ControlFlags::CLOCAL | ControlFlags::CREAD;
    cfsetspeed(&mut termios, baud)?;
    tcsetattr(file, SetArg::TCSANOW, &termios)?;
    Ok(())
}

/// Read and discard until a poll of `window` sees nothing. Returns bytes dropped.
fn drain(file: &File, window: Duration) -> io::Result<usize> {
    let timeout = PollTimeout::from(window.as_millis().min(u16::MAX as u128) as u16);
    let mut reader = file;
    let mut buf = [0u8; DRAIN_CHUNK];
    let mut total = 0;

    loop {
        let mut fds = [PollFd::new(file.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, timeout) {
            Ok(0) => return Ok(total),
            Ok(_) => {}
            Err(nix::errno::Errno::EINTR) => continue,
            Err(e) => return Err(e.into()),
        }

        match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e),
        }
    }
}

fn baud_rate_from(rate: u32) -> Option<BaudRate> {
    match rate {
        9_600 => Some(BaudRate::B9600),
        19_200 => Some(BaudRate::B19200),
        38_400 => Some(BaudRate::B38400),
        57_600 => Some(BaudRate::B57600),
        115_200 => Some(BaudRate::B115200),
        230_400 => Some(BaudRate::B230400),
        _ => None,
    }
}
