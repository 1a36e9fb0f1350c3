// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * NC-SI transport over Linux raw packet sockets
 *
 * Copyright (c) 2025 Code Construct
 */

#![warn(missing_docs)]

//! Linux `AF_PACKET` transport for NC-SI endpoint emulation.
//!
//! This crate provides minimal wrappers around standard [`libc`] socket
//! operations for raw Ethernet frames on a single interface.
//!
//! [`PacketSocket`] provides blocking [`recvfrom`](PacketSocket::recvfrom)
//! and [`send`](PacketSocket::send), and implements [`ncsi::Transmit`] so it
//! can be used directly as the outbound side of an [`ncsi::Session`].
//!
//! ```no_run
//! let ifindex = ncsi_linux::interface_index("eth0")?;
//! let sock = ncsi_linux::PacketSocket::new()?;
//! sock.bind(ifindex)?;
//!
//! let mut buf = [0; ncsi_linux::RECV_BUF_LEN];
//! let (len, src) = sock.recvfrom(&mut buf)?;
//! # Ok::<(), ncsi::NcsiError>(())
//! ```

use core::mem;
use std::ffi::CString;
use std::fmt;
use std::io::{Error, ErrorKind};
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

#[allow(unused)]
use log::{debug, trace};

use ncsi::{NcsiError, Result, Transmit};

/// Packet type of frames sent by this host, looped back to packet sockets.
pub const PACKET_OUTGOING: u8 = 4;

/// Receive buffer size, sufficient for any untagged Ethernet frame
pub const RECV_BUF_LEN: usize = 1536;

/// Look up the index of a network interface by name.
pub fn interface_index(name: &str) -> Result<u32> {
    let cname = CString::new(name).map_err(|_| {
        NcsiError::Io(Error::new(
            ErrorKind::InvalidInput,
            "interface name contains NUL",
        ))
    })?;

    let idx = unsafe { libc::if_nametoindex(cname.as_ptr()) };
    if idx == 0 {
        return Err(last_os_error());
    }
    Ok(idx)
}

/// Link-layer address information for a packet socket
pub struct PacketSockAddr(libc::sockaddr_ll);

impl PacketSockAddr {
    /// Create a new address for interface `ifindex` and `protocol`, in host
    /// byte order.
    pub fn new(ifindex: u32, protocol: u16) -> Self {
        // safety: sockaddr_ll is plain data, all-zeroes is valid
        let mut sa: libc::sockaddr_ll = unsafe { mem::zeroed() };
        sa.sll_family = libc::AF_PACKET as libc::c_ushort;
        sa.sll_protocol = protocol.to_be();
        sa.sll_ifindex = ifindex as libc::c_int;
        PacketSockAddr(sa)
    }

    fn zero() -> Self {
        Self::new(0, 0)
    }

    fn as_raw(&self) -> (*const libc::sockaddr, libc::socklen_t) {
        (
            &self.0 as *const libc::sockaddr_ll as *const libc::sockaddr,
            mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
        )
    }

    fn as_raw_mut(&mut self) -> (*mut libc::sockaddr, libc::socklen_t) {
        (
            &mut self.0 as *mut libc::sockaddr_ll as *mut libc::sockaddr,
            mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
        )
    }

    /// Interface index
    pub fn ifindex(&self) -> u32 {
        self.0.sll_ifindex as u32
    }

    /// Ethernet protocol, in host byte order
    pub fn protocol(&self) -> u16 {
        u16::from_be(self.0.sll_protocol)
    }

    /// Packet type, as reported on receive
    pub fn pkttype(&self) -> u8 {
        self.0.sll_pkttype
    }

    /// Returns true for frames sent by this host
    pub fn is_outgoing(&self) -> bool {
        self.pkttype() == PACKET_OUTGOING
    }
}

impl fmt::Debug for PacketSockAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PacketSockAddr(ifindex={}, protocol=0x{:04x}, pkttype={})",
            self.ifindex(),
            self.protocol(),
            self.pkttype(),
        )
    }
}

/// Returns true for a received frame, possibly truncated, that carries
/// NC-SI and was not sent by this host.
pub fn is_incoming_ncsi(frame: &[u8], addr: &PacketSockAddr) -> bool {
    if addr.is_outgoing() {
        return false;
    }
    match frame.get(12..ncsi::ETH_HLEN) {
        Some(&[hi, lo]) => u16::from_be_bytes([hi, lo]) == ncsi::ETH_P_NCSI,
        _ => false,
    }
}

// helper for IO error construction
fn last_os_error() -> NcsiError {
    NcsiError::Io(Error::last_os_error())
}

/// Raw packet socket, receiving all protocols.
pub struct PacketSocket(OwnedFd);

impl PacketSocket {
    /// Create a new packet socket. It should be bound to an interface
    /// with [`bind`](Self::bind) before use.
    pub fn new() -> Result<Self> {
        let proto = (libc::ETH_P_ALL as u16).to_be();
        let rc = unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                proto as libc::c_int,
            )
        };
        if rc < 0 {
            return Err(last_os_error());
        }
        // safety: the fd is valid, and we have exclusive ownership
        let fd = unsafe { OwnedFd::from_raw_fd(rc) };
        Ok(PacketSocket(fd))
    }

    /// Bind the socket to interface `ifindex`.
    pub fn bind(&self, ifindex: u32) -> Result<()> {
        let addr = PacketSockAddr::new(ifindex, libc::ETH_P_ALL as u16);
        let (addr_ptr, addr_len) = addr.as_raw();
        let fd = self.as_raw_fd();

        let rc = unsafe { libc::bind(fd, addr_ptr, addr_len) };

        if rc < 0 {
            Err(last_os_error())
        } else {
            Ok(())
        }
    }

    // This uses MSG_TRUNC so the returned length may be larger than buf.len()
    fn io_recvfrom(
        &self,
        buf: &mut [u8],
    ) -> std::io::Result<(usize, PacketSockAddr)> {
        let mut addr = PacketSockAddr::zero();
        let (addr_ptr, mut addr_len) = addr.as_raw_mut();
        let buf_ptr = buf.as_mut_ptr() as *mut libc::c_void;
        let buf_len = buf.len() as libc::size_t;
        let fd = self.as_raw_fd();

        let rc = unsafe {
            libc::recvfrom(
                fd,
                buf_ptr,
                buf_len,
                libc::MSG_TRUNC,
                addr_ptr,
                &mut addr_len,
            )
        };

        if rc < 0 {
            Err(Error::last_os_error())
        } else {
            Ok((rc as usize, addr))
        }
    }

    /// Blocking receive of a single frame into `buf`, returning the frame
    /// length and source address.
    ///
    /// Frames larger than `buf` are discarded, returning
    /// [`NcsiError::Oversize`].
    pub fn recvfrom(&self, buf: &mut [u8]) -> Result<(usize, PacketSockAddr)> {
        let (len, addr) = self.io_recvfrom(buf)?;
        if len > buf.len() {
            return Err(NcsiError::Oversize(len));
        }
        Ok((len, addr))
    }

    /// Blocking receive of the next incoming NC-SI frame into `buf`,
    /// returning its length.
    ///
    /// Other traffic on the interface, including frames sent by this host,
    /// is skipped regardless of size. Only an incoming NC-SI frame larger
    /// than `buf` gives [`NcsiError::Oversize`].
    pub fn recv_ncsi(&self, buf: &mut [u8]) -> Result<usize> {
        loop {
            let (len, addr) = self.io_recvfrom(buf)?;
            let frame = &buf[..len.min(buf.len())];

            if !is_incoming_ncsi(frame, &addr) {
                trace!("skipping {len} byte frame, {addr:?}");
                continue;
            }

            if len > buf.len() {
                return Err(NcsiError::Oversize(len));
            }
            return Ok(len);
        }
    }

    /// Blocking send of a single frame on the bound interface, returning the
    /// number of bytes sent.
    pub fn send(&self, buf: &[u8]) -> Result<usize> {
        let buf_ptr = buf.as_ptr() as *const libc::c_void;
        let buf_len = buf.len() as libc::size_t;
        let fd = self.as_raw_fd();

        let rc = unsafe { libc::send(fd, buf_ptr, buf_len, 0) };

        if rc < 0 {
            Err(last_os_error())
        } else {
            Ok(rc as usize)
        }
    }
}

impl Transmit for PacketSocket {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        let sent = self.send(frame)?;
        if sent != frame.len() {
            return Err(NcsiError::Io(Error::new(
                ErrorKind::WriteZero,
                format!("short send, {sent} of {} bytes", frame.len()),
            )));
        }
        Ok(())
    }
}

impl AsRawFd for PacketSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.0.as_raw_fd()
    }
}

impl AsFd for PacketSocket {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.0.as_fd()
    }
}
