// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * NC-SI response synthesis.
 *
 * Copyright (c) 2025 Code Construct
 */

//! Response synthesis.
//!
//! Each request is answered independently: the common response header is
//! built from the command header, the command registry supplies the payload
//! length, and an optional handler fills in the payload.

use deku::DekuError;
#[allow(unused)]
use log::{debug, error, trace, warn};
use num_traits::FromPrimitive;

use crate::codec::{Request, ResponseFrame};
use crate::proto::{
    Cmd, EthHeader, PktHeader, Reason, RspCode, NCSI_RSP_FLAG,
    NCSI_RSP_STATUS_LEN,
};
use crate::{registry, Config, NcsiError, NCSI_MAX_PAYLOAD, NCSI_PKT_REVISION};

/// An in-band failure, reported through the response code and reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandError {
    /// Response code
    pub code: RspCode,
    /// Reason code
    pub reason: Reason,
}

impl CommandError {
    /// Construct a new error
    pub const fn new(code: RspCode, reason: Reason) -> Self {
        Self { code, reason }
    }
}

impl From<NcsiError> for CommandError {
    fn from(_e: NcsiError) -> Self {
        Self::new(RspCode::Failed, Reason::Unknown)
    }
}

impl From<DekuError> for CommandError {
    fn from(e: DekuError) -> Self {
        NcsiError::from(e).into()
    }
}

/// Command handler return type
pub type CommandResult<T> = core::result::Result<T, CommandError>;

/// A response under construction.
#[derive(Debug, Clone)]
pub struct Response {
    /// Response header. The length field is set on encode.
    pub header: PktHeader,
    code: RspCode,
    reason: Reason,
    len: usize,
    // Whole payload, including space for code and reason
    payload: [u8; NCSI_MAX_PAYLOAD],
}

impl Response {
    /// Create a response to `req`, with the common header populated.
    ///
    /// The payload is empty, with a completed status.
    pub fn new(req: &Request) -> Self {
        let header = PktHeader {
            mc_id: req.header.mc_id,
            revision: NCSI_PKT_REVISION,
            iid: req.header.iid,
            typ: req.header.typ | NCSI_RSP_FLAG,
            channel: req.header.channel,
            ..Default::default()
        };
        Self {
            header,
            code: RspCode::Completed,
            reason: Reason::NoError,
            len: 0,
            payload: [0u8; NCSI_MAX_PAYLOAD],
        }
    }

    /// Response code
    pub fn code(&self) -> RspCode {
        self.code
    }

    /// Reason code
    pub fn reason(&self) -> Reason {
        self.reason
    }

    /// Set the response code and reason
    pub fn set_status(&mut self, code: RspCode, reason: Reason) {
        self.code = code;
        self.reason = reason;
    }

    /// Payload length, including code and reason
    pub fn payload_len(&self) -> usize {
        self.len
    }

    /// Set the payload length, including code and reason.
    ///
    /// Limited to the maximum payload size.
    pub fn set_payload_len(&mut self, len: usize) {
        debug_assert!(len <= NCSI_MAX_PAYLOAD);
        self.len = len.min(NCSI_MAX_PAYLOAD);
    }

    /// Response data following the code and reason, up to the payload length
    pub fn data(&self) -> &[u8] {
        let end = self.len.max(NCSI_RSP_STATUS_LEN);
        &self.payload[NCSI_RSP_STATUS_LEN..end]
    }

    /// Writable response data following the code and reason.
    ///
    /// This covers the full payload capacity, independent of the current
    /// payload length.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.payload[NCSI_RSP_STATUS_LEN..]
    }

    /// Report a failure: sets code and reason, and empties the payload.
    pub fn fail(&mut self, e: CommandError) {
        self.set_status(e.code, e.reason);
        self.len = 0;
    }

    /// Produce the response frame
    pub fn encode(&self) -> crate::Result<ResponseFrame> {
        let mut payload = self.payload;
        payload[0..2].copy_from_slice(&(self.code as u16).to_be_bytes());
        payload[2..4].copy_from_slice(&(self.reason as u16).to_be_bytes());

        ResponseFrame::encode(
            &EthHeader::broadcast(),
            &self.header,
            &payload[..self.len],
        )
    }
}

/// Synthesize the response to a decoded request.
pub fn response(config: &Config, req: &Request) -> Response {
    let mut rsp = Response::new(req);

    // response types are never commands, even when they match an entry
    let entry = if req.typ() & NCSI_RSP_FLAG == 0 {
        registry::lookup(rsp.header.typ)
    } else {
        None
    };

    let Some(entry) = entry else {
        debug!("Unsupported command type 0x{:02x}", req.typ());
        rsp.fail(CommandError::new(RspCode::Unavailable, Reason::Unknown));
        return rsp;
    };

    rsp.set_payload_len(entry.payload as usize);

    if let Some(handler) = entry.handler {
        if let Err(e) = handler(config, req, &mut rsp) {
            debug!(
                "Command 0x{:02x} failed, code {:?} reason {:?}",
                req.typ(),
                e.code,
                e.reason
            );
            rsp.fail(e);
        }
    }

    rsp
}

/// Handle a received frame, returning the response to transmit.
///
/// Returns `None` for frames that are dropped: non-NC-SI traffic silently,
/// truncated NC-SI frames with a diagnostic.
pub fn respond(config: &Config, frame: &[u8]) -> Option<ResponseFrame> {
    let req = match Request::decode(frame) {
        Ok(r) => r,
        Err(e) if e.is_silent() => return None,
        Err(e) => {
            warn!("Dropping NC-SI frame: {e}");
            return None;
        }
    };

    trace!("rx {:02x?}", frame);
    debug!(
        "{:?} (0x{:02x}) iid 0x{:02x} channel 0x{:02x}",
        Cmd::from_u8(req.typ()),
        req.typ(),
        req.header.iid,
        req.header.channel,
    );

    let rsp = response(config, &req);
    match rsp.encode() {
        Ok(f) => Some(f),
        Err(e) => {
            error!("Failed to encode response: {e}");
            None
        }
    }
}
