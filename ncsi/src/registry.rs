// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * NC-SI command registry.
 *
 * Copyright (c) 2025 Code Construct
 */

//! Command registry.
//!
//! A static table, keyed by response packet type, giving the default
//! response payload length and an optional handler for each supported
//! command. Payload lengths include the response code and reason.

use crate::codec::Request;
use crate::handlers::*;
use crate::oem::cmd_oem;
use crate::proto::Cmd;
use crate::responder::{CommandResult, Response};
use crate::Config;

/// A command handler.
///
/// Handlers are called with the response payload length already set to the
/// registry default, and may change it.
pub type HandlerFn =
    fn(&Config, &Request<'_>, &mut Response) -> CommandResult<()>;

/// A registry entry
pub struct Handler {
    /// Response packet type
    pub typ: u8,
    /// Default response payload length
    pub payload: u16,
    /// Payload handler. Without one the response data is left zeroed.
    pub handler: Option<HandlerFn>,
}

const fn entry(cmd: Cmd, payload: u16, handler: Option<HandlerFn>) -> Handler {
    Handler {
        typ: cmd.response_type(),
        payload,
        handler,
    }
}

static HANDLERS: [Handler; 30] = [
    entry(Cmd::ClearInitialState, 4, None),
    entry(Cmd::SelectPackage, 4, None),
    entry(Cmd::DeselectPackage, 4, Some(cmd_deselect_package)),
    entry(Cmd::EnableChannel, 4, None),
    entry(Cmd::DisableChannel, 4, None),
    entry(Cmd::ResetChannel, 4, None),
    entry(Cmd::EnableChannelNetworkTx, 4, None),
    entry(Cmd::DisableChannelNetworkTx, 4, None),
    entry(Cmd::AenEnable, 4, None),
    entry(Cmd::SetLink, 4, None),
    entry(Cmd::GetLinkStatus, 16, Some(cmd_get_link_status)),
    entry(Cmd::SetVlanFilter, 4, None),
    entry(Cmd::EnableVlan, 4, None),
    entry(Cmd::DisableVlan, 4, None),
    entry(Cmd::SetMacAddress, 4, None),
    entry(Cmd::EnableBroadcastFilter, 4, None),
    entry(Cmd::DisableBroadcastFilter, 4, None),
    entry(Cmd::EnableGlobalMulticastFilter, 4, None),
    entry(Cmd::DisableGlobalMulticastFilter, 4, None),
    entry(Cmd::SetNcsiFlowControl, 4, None),
    entry(Cmd::GetVersionId, 40, Some(cmd_get_version_id)),
    entry(Cmd::GetCapabilities, 32, Some(cmd_get_capabilities)),
    entry(Cmd::GetParameters, 40, Some(cmd_get_parameters)),
    entry(Cmd::GetControllerPacketStatistics, 172, None),
    entry(Cmd::GetNcsiStatistics, 172, None),
    entry(Cmd::GetNcsiPassthroughStatistics, 172, None),
    entry(Cmd::GetPackageStatus, 8, None),
    // set by the OEM handler
    entry(Cmd::Oem, 0, Some(cmd_oem)),
    entry(Cmd::Pldm, 8, Some(cmd_pldm)),
    entry(Cmd::GetPackageUuid, 20, None),
];

/// All registry entries
pub fn handlers() -> &'static [Handler] {
    &HANDLERS
}

/// Find the entry for a response packet type
pub fn lookup(rsp_type: u8) -> Option<&'static Handler> {
    HANDLERS.iter().find(|h| h.typ == rsp_type)
}
