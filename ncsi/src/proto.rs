// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * NC-SI wire definitions.
 *
 * Copyright (c) 2025 Code Construct
 */

//! NC-SI packet definitions.
//!
//! All multi-byte fields are big-endian on the wire. Structures are
//! serialized field by field, so in-memory layout has no bearing on the
//! encoding.

use deku::{DekuContainerWrite, DekuRead, DekuWrite};
use num_derive::FromPrimitive;

use crate::{NcsiError, Result, ETH_ALEN, ETH_P_NCSI};

/// Set in the packet type of every response
pub const NCSI_RSP_FLAG: u8 = 0x80;

/// Defined bits of the header payload length field
pub const NCSI_LENGTH_MASK: u16 = 0x0fff;

/// Length of the code and reason fields leading every response payload
pub const NCSI_RSP_STATUS_LEN: usize = 4;

/// NC-SI command types
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum Cmd {
    ClearInitialState = 0x00,
    SelectPackage = 0x01,
    DeselectPackage = 0x02,
    EnableChannel = 0x03,
    DisableChannel = 0x04,
    ResetChannel = 0x05,
    EnableChannelNetworkTx = 0x06,
    DisableChannelNetworkTx = 0x07,
    AenEnable = 0x08,
    SetLink = 0x09,
    GetLinkStatus = 0x0A,
    SetVlanFilter = 0x0B,
    EnableVlan = 0x0C,
    DisableVlan = 0x0D,
    SetMacAddress = 0x0E,
    EnableBroadcastFilter = 0x10,
    DisableBroadcastFilter = 0x11,
    EnableGlobalMulticastFilter = 0x12,
    DisableGlobalMulticastFilter = 0x13,
    SetNcsiFlowControl = 0x14,
    GetVersionId = 0x15,
    GetCapabilities = 0x16,
    GetParameters = 0x17,
    GetControllerPacketStatistics = 0x18,
    GetNcsiStatistics = 0x19,
    GetNcsiPassthroughStatistics = 0x1A,
    GetPackageStatus = 0x1B,
    Oem = 0x50,
    Pldm = 0x51,
    GetPackageUuid = 0x52,
}

impl Cmd {
    /// Packet type of the response to this command
    pub const fn response_type(self) -> u8 {
        self as u8 | NCSI_RSP_FLAG
    }
}

/// Response codes
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum RspCode {
    Completed = 0x0000,
    Failed = 0x0001,
    Unavailable = 0x0002,
    Unsupported = 0x0003,
}

/// Response reason codes.
///
/// Only the generic values are generated.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Reason {
    NoError = 0x0000,
    Unknown = 0x7FFF,
}

/// IANA Enterprise Number: Mellanox
pub const MFR_ID_MLX: u32 = 0x8119;
/// IANA Enterprise Number: Broadcom
pub const MFR_ID_BCM: u32 = 0x113D;
/// IANA Enterprise Number: Intel
pub const MFR_ID_INTEL: u32 = 0x157;

/// Mellanox Get MAC Address command
pub const MLX_CMD_GMA: u8 = 0x00;
/// Mellanox Get MAC Address parameter
pub const MLX_CMD_GMA_PARAM: u8 = 0x1B;
/// Mellanox Set MC Affinity command
pub const MLX_CMD_SMAF: u8 = 0x01;
/// Mellanox Set MC Affinity parameter
pub const MLX_CMD_SMAF_PARAM: u8 = 0x07;
/// Offset of the MAC address in Mellanox GMA response data
pub const MLX_MAC_ADDR_OFFSET: usize = 8;

/// Ethernet header
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(endian = "big")]
pub struct EthHeader {
    pub dest: [u8; ETH_ALEN],
    pub source: [u8; ETH_ALEN],
    pub ethertype: u16,
}

impl EthHeader {
    /// Header for responses: NC-SI, broadcast source and destination.
    pub fn broadcast() -> Self {
        Self {
            dest: [0xff; ETH_ALEN],
            source: [0xff; ETH_ALEN],
            ethertype: ETH_P_NCSI,
        }
    }
}

/// NC-SI control packet header, shared by commands and responses
#[derive(Debug, Clone, Default, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(endian = "big")]
pub struct PktHeader {
    /// Management controller ID
    pub mc_id: u8,
    /// Header revision
    pub revision: u8,
    #[doc(hidden)]
    pub reserved: u8,
    /// Instance ID
    pub iid: u8,
    /// Packet type
    pub typ: u8,
    /// Channel ID
    pub channel: u8,
    /// Payload length. Only the low 12 bits are defined.
    pub length: u16,
    #[doc(hidden)]
    pub reserved1: [u8; 8],
}

impl PktHeader {
    /// Payload length, excluding reserved bits
    pub fn payload_len(&self) -> usize {
        (self.length & NCSI_LENGTH_MASK) as usize
    }
}

/// Get Link Status response data
#[allow(missing_docs)]
#[derive(Debug, Default, DekuRead, DekuWrite)]
#[deku(endian = "big")]
pub struct GetLinkStatusResp {
    pub status: u32,
    pub other: u32,
    pub oem_status: u32,
}

/// Get Version ID response data
#[allow(missing_docs)]
#[derive(Debug, Default, DekuRead, DekuWrite)]
#[deku(endian = "big")]
pub struct GetVersionIdResp {
    pub ncsi_version: u32,
    pub reserved: [u8; 3],
    pub alpha2: u8,
    pub fw_name: [u8; 12],
    pub fw_version: u32,
    pub pci_ids: [u16; 4],
    pub mf_id: u32,
}

/// Get Capabilities response data
#[allow(missing_docs)]
#[derive(Debug, Default, DekuRead, DekuWrite)]
#[deku(endian = "big")]
pub struct GetCapabilitiesResp {
    pub cap: u32,
    pub bc_cap: u32,
    pub mc_cap: u32,
    pub buf_cap: u32,
    pub aen_cap: u32,
    pub vlan_cnt: u8,
    pub mixed_cnt: u8,
    pub mc_cnt: u8,
    pub uc_cnt: u8,
    pub reserved: [u8; 2],
    pub vlan_mode: u8,
    pub channel_cnt: u8,
}

/// Get Parameters response data
#[allow(missing_docs)]
#[derive(Debug, Default, DekuRead, DekuWrite)]
#[deku(endian = "big")]
pub struct GetParametersResp {
    pub mac_cnt: u8,
    pub reserved: [u8; 2],
    pub mac_enable: u8,
    pub vlan_cnt: u8,
    pub reserved1: u8,
    pub vlan_enable: u16,
    pub link_mode: u32,
    pub bc_mode: u32,
    pub valid_modes: u32,
    pub vlan_mode: u8,
    pub fc_mode: u8,
    pub reserved2: [u8; 2],
    pub aen_mode: u32,
    pub mac: [u8; ETH_ALEN],
    pub vlan: u16,
}

/// OEM command header: the vendor's IANA Enterprise Number
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(endian = "big")]
pub struct OemHeader {
    pub mf_id: u32,
}

/// Length of [`OemHeader`]
pub const OEM_HDR_LEN: usize = 4;

/// Mellanox OEM sub-header, used in both commands and responses
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, DekuRead, DekuWrite)]
#[deku(endian = "big")]
pub struct MlxHeader {
    pub cmd_rev: u8,
    pub cmd: u8,
    pub param: u8,
    /// PF index / host number
    pub optional: u8,
}

/// Length of [`MlxHeader`]
pub const MLX_HDR_LEN: usize = 4;

/// Serializes a wire structure to the start of `buf`.
///
/// Returns the encoded length.
pub fn encode_into<T: DekuContainerWrite>(v: &T, buf: &mut [u8]) -> Result<usize> {
    let bytes = v.to_bytes()?;
    let out = buf.get_mut(..bytes.len()).ok_or(NcsiError::NoSpace)?;
    out.copy_from_slice(&bytes);
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deku::DekuContainerRead;

    #[test]
    fn header_layout() {
        let h = PktHeader {
            mc_id: 0x11,
            revision: 0x01,
            iid: 0x22,
            typ: 0x33,
            channel: 0x44,
            length: 0x0155,
            ..Default::default()
        };
        let mut buf = [0xaau8; 20];
        let l = encode_into(&h, &mut buf).unwrap();
        assert_eq!(l, 16);
        assert_eq!(
            buf[..16],
            [0x11, 0x01, 0, 0x22, 0x33, 0x44, 0x01, 0x55, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(buf[16..], [0xaa; 4]);
    }

    #[test]
    fn header_length_reserved_bits() {
        let mut b = [0u8; 16];
        b[6] = 0xf0;
        b[7] = 0x04;
        let (_, h) = PktHeader::from_bytes((&b[..], 0)).unwrap();
        assert_eq!(h.length, 0xf004);
        assert_eq!(h.payload_len(), 4);
    }

    #[test]
    fn response_sizes() {
        // payload lengths include the 4-byte code and reason
        let mut buf = [0u8; 64];
        let gls = encode_into(&GetLinkStatusResp::default(), &mut buf).unwrap();
        assert_eq!(gls + NCSI_RSP_STATUS_LEN, 16);
        let gvi = encode_into(&GetVersionIdResp::default(), &mut buf).unwrap();
        assert_eq!(gvi + NCSI_RSP_STATUS_LEN, 40);
        let gc = encode_into(&GetCapabilitiesResp::default(), &mut buf).unwrap();
        assert_eq!(gc + NCSI_RSP_STATUS_LEN, 32);
        let gp = encode_into(&GetParametersResp::default(), &mut buf).unwrap();
        assert_eq!(gp + NCSI_RSP_STATUS_LEN, 40);
    }

    #[test]
    fn encode_nospace() {
        let mut buf = [0u8; 3];
        let r = encode_into(&OemHeader { mf_id: MFR_ID_MLX }, &mut buf);
        assert!(matches!(r, Err(NcsiError::NoSpace)));
    }

    #[test]
    fn response_types() {
        assert_eq!(Cmd::DeselectPackage.response_type(), 0x82);
        assert_eq!(Cmd::Oem.response_type(), 0xd0);
    }
}
