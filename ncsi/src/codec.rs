// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * NC-SI frame codec.
 *
 * Copyright (c) 2025 Code Construct
 */

//! Decoding of received frames and layout of response frames.

use deku::DekuContainerRead;
use log::trace;

use crate::checksum;
use crate::proto::{encode_into, EthHeader, PktHeader};
use crate::{
    NcsiError, Result, ETH_HLEN, ETH_P_NCSI, ETH_ZLEN, NCSI_CHECKSUM_LEN,
    NCSI_MAX_FRAME, NCSI_MAX_PAYLOAD, NCSI_PAYLOAD_OFFSET,
};

/// A received NC-SI command, borrowing its payload from the frame.
#[derive(Debug)]
pub struct Request<'a> {
    /// Ethernet header
    pub eth: EthHeader,
    /// NC-SI control packet header
    pub header: PktHeader,
    /// Command payload, excluding any checksum.
    ///
    /// Bounded by both the header's payload length and the received data.
    pub payload: &'a [u8],
}

impl<'a> Request<'a> {
    /// Decode a received frame.
    ///
    /// Frames without an Ethernet header, or with a different EtherType,
    /// fail with errors for which [`NcsiError::is_silent`] holds.
    pub fn decode(frame: &'a [u8]) -> Result<Self> {
        if frame.len() < ETH_HLEN {
            return Err(NcsiError::NoEthernetHeader(frame.len()));
        }

        let (_, eth) = EthHeader::from_bytes((frame, 0))?;
        if eth.ethertype != ETH_P_NCSI {
            return Err(NcsiError::NotNcsi {
                ethertype: eth.ethertype,
            });
        }

        if frame.len() < NCSI_PAYLOAD_OFFSET {
            return Err(NcsiError::Truncated(frame.len()));
        }

        let (_, header) = PktHeader::from_bytes((&frame[ETH_HLEN..], 0))?;

        let rest = &frame[NCSI_PAYLOAD_OFFSET..];
        let len = header.payload_len();
        if len > rest.len() {
            trace!("payload length {len} exceeds frame, {} available", rest.len());
        }
        let payload = &rest[..len.min(rest.len())];

        Ok(Self {
            eth,
            header,
            payload,
        })
    }

    /// Packet type of the command
    pub fn typ(&self) -> u8 {
        self.header.typ
    }
}

/// A complete response frame, ready to transmit.
#[derive(Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    buf: [u8; NCSI_MAX_FRAME],
    len: usize,
}

impl ResponseFrame {
    /// Lay out a frame from headers and payload, and append the checksum.
    ///
    /// The header's length field is taken from `payload`. Frames are padded
    /// to the Ethernet minimum.
    pub fn encode(
        eth: &EthHeader,
        header: &PktHeader,
        payload: &[u8],
    ) -> Result<Self> {
        if payload.len() > NCSI_MAX_PAYLOAD {
            return Err(NcsiError::NoSpace);
        }

        let header = PktHeader {
            length: payload.len() as u16,
            ..header.clone()
        };

        let mut buf = [0u8; NCSI_MAX_FRAME];
        encode_into(eth, &mut buf[..ETH_HLEN])?;
        encode_into(&header, &mut buf[ETH_HLEN..NCSI_PAYLOAD_OFFSET])?;

        let end = NCSI_PAYLOAD_OFFSET + payload.len();
        buf[NCSI_PAYLOAD_OFFSET..end].copy_from_slice(payload);

        let csum = checksum::calculate(&buf[ETH_HLEN..end]);
        buf[end..end + NCSI_CHECKSUM_LEN].copy_from_slice(&csum.to_be_bytes());

        let len = (end + NCSI_CHECKSUM_LEN).max(ETH_ZLEN);
        Ok(Self { buf, len })
    }

    /// The frame contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Length of the frame, including padding
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true for an empty frame
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for ResponseFrame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl core::fmt::Debug for ResponseFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ResponseFrame({:02x?})", self.as_bytes())
    }
}
