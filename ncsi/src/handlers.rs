// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * NC-SI standard command handlers.
 *
 * Copyright (c) 2025 Code Construct
 */

#[allow(unused)]
use log::{debug, trace};

use crate::codec::Request;
use crate::proto::{
    encode_into, GetCapabilitiesResp, GetLinkStatusResp, GetParametersResp,
    GetVersionIdResp, MFR_ID_BCM, MFR_ID_INTEL, MFR_ID_MLX,
};
use crate::responder::{CommandResult, Response};
use crate::Config;

/// NC-SI 1.1 (BCD, alpha unused)
const NCSI_VERSION: u32 = 0xF1F0F000;
const FW_VERSION: u32 = 0x00010000;
const LINK_UP: u32 = 0x1;

fn mfr_name(mfr_id: u32) -> &'static str {
    match mfr_id {
        MFR_ID_MLX => "mlx",
        MFR_ID_BCM => "bcm",
        MFR_ID_INTEL => "intel",
        _ => "nic",
    }
}

pub(crate) fn cmd_deselect_package(
    _config: &Config,
    _req: &Request,
    rsp: &mut Response,
) -> CommandResult<()> {
    // The command is addressed to the package (channel 0x1f), but the
    // response should not carry that through.
    rsp.header.channel = 0x00;
    Ok(())
}

pub(crate) fn cmd_get_link_status(
    _config: &Config,
    _req: &Request,
    rsp: &mut Response,
) -> CommandResult<()> {
    let gls = GetLinkStatusResp {
        status: LINK_UP,
        ..Default::default()
    };
    encode_into(&gls, rsp.data_mut())?;
    Ok(())
}

pub(crate) fn cmd_get_version_id(
    config: &Config,
    _req: &Request,
    rsp: &mut Response,
) -> CommandResult<()> {
    let mut gvi = GetVersionIdResp {
        ncsi_version: NCSI_VERSION,
        fw_version: FW_VERSION,
        mf_id: config.mfr_id,
        ..Default::default()
    };

    // NUL terminated within the field
    let name = format!("{}0.1", mfr_name(config.mfr_id));
    let n = name.len().min(gvi.fw_name.len() - 1);
    gvi.fw_name[..n].copy_from_slice(&name.as_bytes()[..n]);

    encode_into(&gvi, rsp.data_mut())?;
    Ok(())
}

pub(crate) fn cmd_get_capabilities(
    _config: &Config,
    _req: &Request,
    rsp: &mut Response,
) -> CommandResult<()> {
    let gc = GetCapabilitiesResp {
        cap: !0,
        bc_cap: !0,
        mc_cap: !0,
        buf_cap: !0,
        aen_cap: !0,
        vlan_mode: 0xff,
        uc_cnt: 2,
        ..Default::default()
    };
    encode_into(&gc, rsp.data_mut())?;
    Ok(())
}

pub(crate) fn cmd_get_parameters(
    _config: &Config,
    _req: &Request,
    rsp: &mut Response,
) -> CommandResult<()> {
    // no MAC address or VLAN filters on the channel
    encode_into(&GetParametersResp::default(), rsp.data_mut())?;
    Ok(())
}

pub(crate) fn cmd_pldm(
    _config: &Config,
    req: &Request,
    _rsp: &mut Response,
) -> CommandResult<()> {
    trace!("PLDM request, {} bytes, acknowledged", req.payload.len());
    Ok(())
}
