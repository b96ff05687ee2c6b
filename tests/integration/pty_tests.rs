//! Serial channel and supervisor against a pseudo-terminal standing in for the device

use crate::common::{FixedApp, SharedVolume};
use macropad_bridge::core::config::{SerialConfig, TimingConfig};
use macropad_bridge::serial::{Channel, DevicePath, ReadOutcome, SerialChannel};
use macropad_bridge::session::{
    CommandRouter, SerialConnector, ShutdownClock, Supervisor, SupervisorState,
};
use macropad_bridge::{MicMuteAction, MicState, Shutdown};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::pty::openpty;
use nix::sys::termios::{cfmakeraw, tcgetattr, tcsetattr, SetArg};
use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

struct Pty {
    /// Device side
    master: File,
    slave_path: PathBuf,
    _slave: OwnedFd,
}

fn open_pty() -> Pty {
    let pty = openpty(None, None).unwrap();
    let slave_path =
        std::fs::read_link(format!("/proc/self/fd/{}", pty.slave.as_raw_fd())).unwrap();

    // Raw from the start so queued bytes are not held for line editing
    let mut termios = tcgetattr(&pty.slave).unwrap();
    cfmakeraw(&mut termios);
    tcsetattr(&pty.slave, SetArg::TCSANOW, &termios).unwrap();

    Pty {
        master: File::from(pty.master),
        slave_path,
        _slave: pty.slave,
    }
}

fn fast_serial() -> SerialConfig {
    SerialConfig {
        drain_window_ms: 50,
        ..SerialConfig::default()
    }
}

/// Read from the device side until a full line arrives or `timeout` passes
fn read_line(master: &mut File, timeout: Duration) -> Option<String> {
    let deadline = Instant::now() + timeout;
    let mut out = Vec::new();
    while !out.ends_with(b"\n") {
        let remaining = deadline.checked_duration_since(Instant::now())?;
        let ready = {
            let mut fds = [PollFd::new(master.as_fd(), PollFlags::POLLIN)];
            let ms = remaining.as_millis().min(u16::MAX as u128) as u16;
            poll(&mut fds, PollTimeout::from(ms)).ok()?
        };
        if ready == 0 {
            return None;
        }
        let mut buf = [0u8; 256];
        let n = master.read(&mut buf).ok()?;
        out.extend_from_slice(&buf[..n]);
    }
    Some(String::from_utf8_lossy(&out).into_owned())
}

/// Poll the channel until something other than `NoData` shows up
fn next_outcome(channel: &mut SerialChannel) -> ReadOutcome {
    for _ in 0..200 {
        match channel.read_available() {
            ReadOutcome::NoData => thread::sleep(Duration::from_millis(5)),
            other => return other,
        }
    }
    ReadOutcome::NoData
}

#[test]
fn test_open_discards_boot_output() {
    let mut pty = open_pty();
    pty.master.write_all(b"\x1b]0;code.py\x1b\\Auto-reload is on.\r\n").unwrap();

    let mut channel =
        SerialChannel::open(&DevicePath::new(&pty.slave_path), &fast_serial()).unwrap();

    assert!(matches!(channel.read_available(), ReadOutcome::NoData));
}

#[test]
fn test_channel_exchanges_lines() {
    let mut pty = open_pty();
    let mut channel =
        SerialChannel::open(&DevicePath::new(&pty.slave_path), &fast_serial()).unwrap();

    pty.master.write_all(b"MIC_TOGGLE\n").unwrap();
    match next_outcome(&mut channel) {
        ReadOutcome::Data(bytes) => assert_eq!(bytes, b"MIC_TOGGLE\n"),
        other => panic!("expected data, got {:?}", other),
    }

    channel.write(b"Safari\n").unwrap();
    assert_eq!(
        read_line(&mut pty.master, Duration::from_secs(2)).as_deref(),
        Some("Safari\n")
    );
}

#[test]
fn test_device_hangup_is_not_no_data() {
    let pty = open_pty();
    let mut channel =
        SerialChannel::open(&DevicePath::new(&pty.slave_path), &fast_serial()).unwrap();

    drop(pty.master);

    let outcome = next_outcome(&mut channel);
    assert!(
        matches!(outcome, ReadOutcome::Closed | ReadOutcome::Error(_)),
        "got {:?}",
        outcome
    );
}

#[test]
fn test_close_is_idempotent() {
    let pty = open_pty();
    let mut channel =
        SerialChannel::open(&DevicePath::new(&pty.slave_path), &fast_serial()).unwrap();

    channel.close();
    channel.close();

    assert!(!channel.is_open());
    assert!(matches!(channel.read_available(), ReadOutcome::Closed));
    assert!(channel.write(b"late\n").is_err());
}

#[test]
fn test_supervisor_end_to_end() {
    let mut pty = open_pty();
    let shutdown = Shutdown::new();
    let volume = SharedVolume::new(42);
    let mut supervisor = Supervisor::new(
        SerialConnector::new(Some(pty.slave_path.clone()), fast_serial()),
        ShutdownClock::new(shutdown.clone()),
        CommandRouter::new(MicMuteAction::new(Box::new(volume.clone()))),
        Box::new(FixedApp("Safari")),
        TimingConfig {
            tick_interval_ms: 20,
            retry_interval_ms: 50,
        },
    );
    let worker = thread::spawn(move || {
        supervisor.run();
        supervisor
    });

    assert_eq!(
        read_line(&mut pty.master, Duration::from_secs(5)).as_deref(),
        Some("Safari\n")
    );
    pty.master.write_all(b"MIC_TOGGLE\n").unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while volume.get() != 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    shutdown.trigger();
    let supervisor = worker.join().unwrap();

    assert_eq!(
        supervisor.router().mic().state(),
        MicState::Muted { saved_volume: 42 }
    );
    assert_eq!(volume.get(), 0);
}

#[test]
fn test_interrupt_before_run_leaves_device_untouched() {
    let mut pty = open_pty();
    let shutdown = Shutdown::new();
    shutdown.trigger();
    let mut supervisor = Supervisor::new(
        SerialConnector::new(Some(pty.slave_path.clone()), fast_serial()),
        ShutdownClock::new(shutdown),
        CommandRouter::new(MicMuteAction::new(Box::new(SharedVolume::new(42)))),
        Box::new(FixedApp("Safari")),
        TimingConfig {
            tick_interval_ms: 20,
            retry_interval_ms: 50,
        },
    );

    supervisor.run();

    assert_eq!(supervisor.state(), &SupervisorState::Stopped);
    assert_eq!(read_line(&mut pty.master, Duration::from_millis(300)), None);
}
