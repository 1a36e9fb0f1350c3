// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * NC-SI OEM command handling.
 *
 * Copyright (c) 2025 Code Construct
 */

//! OEM command (type 0x50) support.
//!
//! OEM commands carry the vendor's IANA Enterprise Number as the first
//! payload word. We only answer for the emulated manufacturer, then dispatch
//! to a per-vendor handler.
//!
//! Response data (following code and reason) starts with the echoed
//! manufacturer ID; vendor handlers write after that.

use deku::DekuContainerRead;
#[allow(unused)]
use log::{debug, trace};

use crate::codec::Request;
use crate::proto::{
    encode_into, MlxHeader, OemHeader, Reason, RspCode, MFR_ID_BCM,
    MFR_ID_INTEL, MFR_ID_MLX, MLX_CMD_GMA, MLX_CMD_GMA_PARAM, MLX_CMD_SMAF,
    MLX_CMD_SMAF_PARAM, MLX_MAC_ADDR_OFFSET, OEM_HDR_LEN,
};
use crate::registry::HandlerFn;
use crate::responder::{CommandError, CommandResult, Response};
use crate::{Config, ETH_ALEN};

/// Response payload length of Mellanox Get MAC Address
const MLX_GMA_PAYLOAD: usize = 24;
/// Response payload length of Mellanox Set MC Affinity
const MLX_SMAF_PAYLOAD: usize = 12;

/// An OEM registry entry
pub struct OemHandler {
    /// IANA Enterprise Number
    pub mf_id: u32,
    /// Vendor handler. Without one the response is a plain completion.
    pub handler: Option<HandlerFn>,
}

static OEM_HANDLERS: [OemHandler; 3] = [
    OemHandler {
        mf_id: MFR_ID_MLX,
        handler: Some(cmd_oem_mlx),
    },
    OemHandler {
        mf_id: MFR_ID_BCM,
        handler: None,
    },
    OemHandler {
        mf_id: MFR_ID_INTEL,
        handler: None,
    },
];

/// Find the OEM entry for a manufacturer
pub fn lookup(mf_id: u32) -> Option<&'static OemHandler> {
    OEM_HANDLERS.iter().find(|h| h.mf_id == mf_id)
}

pub(crate) fn cmd_oem(
    config: &Config,
    req: &Request,
    rsp: &mut Response,
) -> CommandResult<()> {
    let (_, oem) = OemHeader::from_bytes((req.payload, 0))?;

    if oem.mf_id != config.mfr_id {
        debug!(
            "OEM command for manufacturer 0x{:x}, we are 0x{:x}",
            oem.mf_id, config.mfr_id
        );
        return Err(CommandError::new(RspCode::Unsupported, Reason::Unknown));
    }

    encode_into(&oem, rsp.data_mut())?;

    let Some(vendor) = lookup(oem.mf_id) else {
        debug!("No OEM handler for manufacturer 0x{:x}", oem.mf_id);
        return Err(CommandError::new(RspCode::Unavailable, Reason::Unknown));
    };

    match vendor.handler {
        Some(handler) => handler(config, req, rsp),
        None => Ok(()),
    }
}

fn cmd_oem_mlx(
    config: &Config,
    req: &Request,
    rsp: &mut Response,
) -> CommandResult<()> {
    let data = req.payload.get(OEM_HDR_LEN..).unwrap_or_default();
    let (_, cmd) = MlxHeader::from_bytes((data, 0))?;

    let echo = MlxHeader {
        optional: 0,
        ..cmd.clone()
    };
    encode_into(&echo, &mut rsp.data_mut()[OEM_HDR_LEN..])?;

    match (cmd.cmd, cmd.param) {
        (MLX_CMD_GMA, MLX_CMD_GMA_PARAM) => cmd_oem_mlx_gma(config, rsp),
        (MLX_CMD_SMAF, MLX_CMD_SMAF_PARAM) => cmd_oem_mlx_smaf(&cmd, rsp),
        (c, p) => {
            debug!("Unhandled Mellanox OEM command 0x{c:02x}, param 0x{p:02x}");
            Ok(())
        }
    }
}

/// Get MAC Address
fn cmd_oem_mlx_gma(config: &Config, rsp: &mut Response) -> CommandResult<()> {
    rsp.set_payload_len(MLX_GMA_PAYLOAD);
    let off = OEM_HDR_LEN + MLX_MAC_ADDR_OFFSET;
    rsp.data_mut()[off..off + ETH_ALEN].copy_from_slice(&config.ncsi_mac.0);
    Ok(())
}

/// Set MC Affinity
fn cmd_oem_mlx_smaf(cmd: &MlxHeader, rsp: &mut Response) -> CommandResult<()> {
    rsp.set_payload_len(MLX_SMAF_PAYLOAD);
    let host = cmd.optional;
    rsp.data_mut()[OEM_HDR_LEN..OEM_HDR_LEN + 4]
        .copy_from_slice(&[0x00, MLX_CMD_SMAF, MLX_CMD_SMAF_PARAM, host]);
    Ok(())
}
