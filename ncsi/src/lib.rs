// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * NC-SI endpoint emulation: common types.
 *
 * Copyright (c) 2025 Code Construct
 */

#![warn(missing_docs)]

//! # Network Controller Sideband Interface (NC-SI) endpoint emulation
//!
//! This crate implements the network-controller side of NC-SI (DMTF
//! DSP0222): it accepts NC-SI control packets sent by a management controller
//! and synthesizes the responses a real network adapter would produce.
//!
//! The crate performs no I/O itself. Received frames are passed to
//! [`Session::handle_frame`], which sends any response through the
//! [`Transmit`] implementation held by the session.
//!
//! ```
//! use ncsi::{Config, Session, Transmit};
//!
//! struct Sink(Vec<Vec<u8>>);
//!
//! impl Transmit for Sink {
//!     fn transmit(&mut self, frame: &[u8]) -> ncsi::Result<()> {
//!         self.0.push(frame.to_vec());
//!         Ok(())
//!     }
//! }
//!
//! let mut session = Session::new(Config::default(), Sink(Vec::new()));
//!
//! // Get Link Status, IID 1, channel 0
//! let mut frame = [0u8; 64];
//! frame[12..14].copy_from_slice(&ncsi::ETH_P_NCSI.to_be_bytes());
//! frame[15] = 0x01;
//! frame[17] = 0x01;
//! frame[18] = 0x0a;
//! session.handle_frame(&frame);
//!
//! let sent = &session.transmitter().0;
//! assert_eq!(sent.len(), 1);
//! assert_eq!(sent[0][18], 0x8a);
//! ```

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

pub mod checksum;
pub mod codec;
mod handlers;
pub mod oem;
pub mod proto;
pub mod registry;
pub mod responder;

pub use codec::{Request, ResponseFrame};
pub use responder::{respond, CommandError, CommandResult, Response};

/// NC-SI EtherType
pub const ETH_P_NCSI: u16 = 0x88F8;
/// Length of an Ethernet header
pub const ETH_HLEN: usize = 14;
/// Length of an Ethernet hardware address
pub const ETH_ALEN: usize = 6;
/// Minimum transmitted frame size. Shorter frames are zero-padded.
pub const ETH_ZLEN: usize = 64;

/// Length of the NC-SI control packet header
pub const NCSI_HDR_LEN: usize = 16;
/// Frame offset of the NC-SI payload
pub const NCSI_PAYLOAD_OFFSET: usize = ETH_HLEN + NCSI_HDR_LEN;
/// Largest response payload we generate
pub const NCSI_MAX_PAYLOAD: usize = 172;
/// Length of the trailing checksum
pub const NCSI_CHECKSUM_LEN: usize = 4;
/// Largest frame we generate
pub const NCSI_MAX_FRAME: usize =
    NCSI_PAYLOAD_OFFSET + NCSI_MAX_PAYLOAD + NCSI_CHECKSUM_LEN;

/// Header revision set in all responses
pub const NCSI_PKT_REVISION: u8 = 0x01;

/// Default emulated MAC address
pub const DEFAULT_MAC: MacAddr = MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);

/// Generic NC-SI error type
#[derive(Error, Debug)]
pub enum NcsiError {
    /// Frame too short for an Ethernet header
    #[error("frame too short for an ethernet header ({0} bytes)")]
    NoEthernetHeader(usize),
    /// Frame is not NC-SI traffic
    #[error("not an NC-SI frame (ethertype 0x{ethertype:04x})")]
    NotNcsi {
        /// EtherType found in the frame
        ethertype: u16,
    },
    /// NC-SI frame too short for the control packet header
    #[error("NC-SI frame too short ({0} bytes)")]
    Truncated(usize),
    /// Received frame larger than the receive buffer
    #[error("oversized frame ({0} bytes)")]
    Oversize(usize),
    /// Output buffer too small
    #[error("no space in output buffer")]
    NoSpace,
    /// Wire structure decode/encode failure
    #[error("wire format error: {0}")]
    Decode(#[from] deku::DekuError),
    /// Socket or transmit failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NcsiError {
    /// Returns true for frames that are dropped without a diagnostic.
    ///
    /// A raw socket sees all traffic on the interface, so anything that
    /// isn't NC-SI is expected.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::NoEthernetHeader(_) | Self::NotNcsi { .. })
    }
}

/// NC-SI return type
pub type Result<T> = std::result::Result<T, NcsiError>;

/// An Ethernet hardware address.
///
/// Parses from and displays as the usual colon-separated hex form.
/// A `-` separator is also accepted when parsing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; ETH_ALEN]);

impl FromStr for MacAddr {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<MacAddr, String> {
        let mut mac = [0u8; ETH_ALEN];
        let mut parts = s.split([':', '-']);

        for b in mac.iter_mut() {
            let p = parts
                .next()
                .ok_or_else(|| format!("MAC address '{s}' too short"))?;
            if p.is_empty() || p.len() > 2 {
                return Err(format!("bad MAC address octet '{p}'"));
            }
            *b = u8::from_str_radix(p, 16).map_err(|e| e.to_string())?;
        }

        if parts.next().is_some() {
            return Err(format!("MAC address '{s}' too long"));
        }

        Ok(MacAddr(mac))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            m[0], m[1], m[2], m[3], m[4], m[5]
        )
    }
}

/// Emulated controller identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// IANA Enterprise Number of the emulated manufacturer. OEM commands
    /// are only answered for this ID.
    pub mfr_id: u32,
    /// MAC address reported through OEM commands
    pub ncsi_mac: MacAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mfr_id: proto::MFR_ID_MLX,
            ncsi_mac: DEFAULT_MAC,
        }
    }
}

/// Outbound side of a session.
pub trait Transmit {
    /// Send a completed frame.
    fn transmit(&mut self, frame: &[u8]) -> Result<()>;
}

impl<T: Transmit + ?Sized> Transmit for &mut T {
    fn transmit(&mut self, frame: &[u8]) -> Result<()> {
        (**self).transmit(frame)
    }
}

/// An emulated NC-SI endpoint: identity plus the transmit handle.
///
/// Requests are handled one at a time and no state is kept between them.
pub struct Session<T> {
    config: Config,
    tx: T,
}

impl<T: Transmit> Session<T> {
    /// Create a new session
    pub fn new(config: Config, tx: T) -> Self {
        Self { config, tx }
    }

    /// Returns the emulated identity
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Borrow the transmit handle
    pub fn transmitter(&self) -> &T {
        &self.tx
    }

    /// Handle a received frame.
    ///
    /// Frames that are not valid NC-SI commands are dropped. Otherwise a
    /// response is synthesized and transmitted. Transmit failures are logged
    /// and otherwise ignored.
    pub fn handle_frame(&mut self, frame: &[u8]) {
        let Some(rsp) = respond(&self.config, frame) else {
            return;
        };

        log::trace!("tx {:02x?}", rsp.as_bytes());
        if let Err(e) = self.tx.transmit(rsp.as_bytes()) {
            log::warn!("Failed to send NC-SI response: {e}");
        }
    }
}
