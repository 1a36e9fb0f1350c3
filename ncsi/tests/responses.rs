// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * Copyright (c) 2025 Code Construct
 */

//! End-to-end request/response scenarios through a `Session`.

#[allow(unused)]
use log::{debug, trace};

use ncsi::proto::{Reason, RspCode};
use ncsi::{checksum, Config, MacAddr, Request, Session, Transmit};

fn start_log() {
    let _ = env_logger::Builder::new()
        .filter(None, log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

/// Records transmitted frames
#[derive(Default)]
struct Capture(Vec<Vec<u8>>);

impl Transmit for Capture {
    fn transmit(&mut self, frame: &[u8]) -> ncsi::Result<()> {
        self.0.push(frame.to_vec());
        Ok(())
    }
}

/// Always fails to send
struct Broken;

impl Transmit for Broken {
    fn transmit(&mut self, _frame: &[u8]) -> ncsi::Result<()> {
        Err(ncsi::NcsiError::Io(std::io::Error::other("link down")))
    }
}

fn config() -> Config {
    Config {
        mfr_id: 0x8119,
        ncsi_mac: "AA:BB:CC:DD:EE:FF".parse().unwrap(),
    }
}

/// Builds a command frame, with BMC-style source address
fn cmd(typ: u8, iid: u8, channel: u8, payload: &[u8]) -> Vec<u8> {
    let mut f = vec![0u8; 30 + payload.len()];
    f[0..6].copy_from_slice(&[0xff; 6]);
    f[6..12].copy_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
    f[12..14].copy_from_slice(&[0x88, 0xf8]);
    f[15] = 0x01;
    f[17] = iid;
    f[18] = typ;
    f[19] = channel;
    f[20..22].copy_from_slice(&(payload.len() as u16).to_be_bytes());
    f[30..].copy_from_slice(payload);
    if f.len() < 64 {
        f.resize(64, 0);
    }
    f
}

/// Sends a single frame through a session, returning the responses
fn exchange(config: Config, frame: &[u8]) -> Vec<Vec<u8>> {
    start_log();
    let mut session = Session::new(config, Capture::default());
    session.handle_frame(frame);
    session.transmitter().0.clone()
}

fn single(frame: &[u8]) -> Vec<u8> {
    let mut r = exchange(config(), frame);
    assert_eq!(r.len(), 1, "expected one response");
    r.remove(0)
}

fn be16(b: &[u8], off: usize) -> u16 {
    u16::from_be_bytes(b[off..off + 2].try_into().unwrap())
}

fn be32(b: &[u8], off: usize) -> u32 {
    u32::from_be_bytes(b[off..off + 4].try_into().unwrap())
}

fn payload_len(rsp: &[u8]) -> usize {
    (be16(rsp, 20) & 0x0fff) as usize
}

fn check_checksum(rsp: &[u8]) {
    let end = 30 + payload_len(rsp);
    let c = be32(rsp, end);
    assert!(checksum::verify(&rsp[14..end], c), "bad checksum");
    assert_ne!(c, 0);
}

#[test]
fn deselect_package() {
    let rsp = single(&cmd(0x02, 0x05, 0x1f, &[]));
    assert_eq!(rsp[18], 0x82);
    assert_eq!(rsp[17], 0x05);
    assert_eq!(rsp[19], 0x00);
    assert_eq!(payload_len(&rsp), 4);
    assert_eq!(be16(&rsp, 30), 0x0000);
    assert_eq!(be16(&rsp, 32), 0x0000);
    assert_eq!(rsp.len(), 64);
    check_checksum(&rsp);
}

#[test]
fn get_link_status() {
    let rsp = single(&cmd(0x0a, 0x10, 0x00, &[]));
    assert_eq!(rsp[18], 0x8a);
    assert_eq!(rsp[17], 0x10);
    assert_eq!(payload_len(&rsp), 16);
    assert_eq!(be16(&rsp, 30), 0x0000);
    assert_eq!(rsp[34..38], [0x00, 0x00, 0x00, 0x01]);
    check_checksum(&rsp);
}

#[test]
fn get_version_id() {
    let rsp = single(&cmd(0x15, 0x01, 0x00, &[]));
    assert_eq!(rsp[18], 0x95);
    assert_eq!(payload_len(&rsp), 40);
    assert_eq!(rsp.len(), 74);
    assert_eq!(be32(&rsp, 34), 0xf1f0f000);
    assert_eq!(&rsp[42..48], b"mlx0.1");
    assert!(rsp[48..54].iter().all(|&b| b == 0));
    assert_eq!(be32(&rsp, 54), 0x00010000);
    assert_eq!(be32(&rsp, 66), 0x00008119);
    check_checksum(&rsp);
}

#[test]
fn get_version_id_vendor_names() {
    let cfg = Config {
        mfr_id: 0x157,
        ..config()
    };
    let rsp = exchange(cfg, &cmd(0x15, 0x01, 0x00, &[])).remove(0);
    assert_eq!(&rsp[42..50], b"intel0.1");
    assert_eq!(be32(&rsp, 66), 0x157);

    let cfg = Config {
        mfr_id: 0x4242,
        ..config()
    };
    let rsp = exchange(cfg, &cmd(0x15, 0x01, 0x00, &[])).remove(0);
    assert_eq!(&rsp[42..48], b"nic0.1");
}

#[test]
fn get_capabilities() {
    let rsp = single(&cmd(0x16, 0x02, 0x00, &[]));
    assert_eq!(rsp[18], 0x96);
    assert_eq!(payload_len(&rsp), 32);
    for off in [34, 38, 42, 46, 50] {
        assert_eq!(be32(&rsp, off), 0xffff_ffff);
    }
    // uc_cnt, vlan_mode
    assert_eq!(rsp[57], 2);
    assert_eq!(rsp[60], 0xff);
    check_checksum(&rsp);
}

#[test]
fn get_parameters() {
    let rsp = single(&cmd(0x17, 0x03, 0x00, &[]));
    assert_eq!(rsp[18], 0x97);
    assert_eq!(payload_len(&rsp), 40);
    assert!(rsp[30..70].iter().all(|&b| b == 0));
    check_checksum(&rsp);
}

#[test]
fn statistics_lengths() {
    for (typ, len) in [(0x18, 172), (0x19, 172), (0x1a, 172), (0x1b, 8), (0x52, 20)] {
        let rsp = single(&cmd(typ, 0x01, 0x00, &[]));
        assert_eq!(payload_len(&rsp), len);
        assert_eq!(rsp.len(), (34 + len).max(64));
        check_checksum(&rsp);
    }
}

#[test]
fn pldm_acknowledged() {
    let rsp = single(&cmd(0x51, 0x09, 0x00, &[0x80, 0x00, 0x02]));
    assert_eq!(rsp[18], 0xd1);
    assert_eq!(payload_len(&rsp), 8);
    assert_eq!(be16(&rsp, 30), 0x0000);
    assert!(rsp[34..38].iter().all(|&b| b == 0));
}

#[test]
fn oem_mellanox_gma() {
    let rsp = single(&cmd(
        0x50,
        0x21,
        0x00,
        &[0x00, 0x00, 0x81, 0x19, 0x00, 0x00, 0x1b, 0x00],
    ));
    assert_eq!(rsp[18], 0xd0);
    assert_eq!(payload_len(&rsp), 24);
    assert_eq!(be16(&rsp, 30), 0x0000);
    assert_eq!(be32(&rsp, 34), 0x8119);
    assert_eq!(rsp[38..41], [0x00, 0x00, 0x1b]);
    assert_eq!(rsp[46..52], [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    check_checksum(&rsp);
}

#[test]
fn oem_mellanox_gma_configured_mac() {
    let mac: MacAddr = "02:11:22:33:44:55".parse().unwrap();
    let cfg = Config {
        ncsi_mac: mac,
        ..config()
    };
    let rsp = exchange(
        cfg,
        &cmd(0x50, 0x01, 0x00, &[0x00, 0x00, 0x81, 0x19, 0x00, 0x00, 0x1b, 0x00]),
    )
    .remove(0);
    assert_eq!(rsp[46..52], mac.0);
}

#[test]
fn oem_mellanox_smaf() {
    let rsp = single(&cmd(
        0x50,
        0x22,
        0x00,
        &[0x00, 0x00, 0x81, 0x19, 0x00, 0x01, 0x07, 0x02, 0x00, 0x00],
    ));
    assert_eq!(payload_len(&rsp), 12);
    assert_eq!(rsp[38..42], [0x00, 0x01, 0x07, 0x02]);
    check_checksum(&rsp);
}

#[test]
fn oem_unknown_vendor() {
    let f = cmd(0x50, 0x23, 0x00, &[0x00, 0x00, 0x00, 0x01]);
    let rsp = single(&f);
    assert_eq!(rsp[18], 0xd0);
    assert_eq!(payload_len(&rsp), 0);
    assert_eq!(rsp.len(), 64);
    check_checksum(&rsp);

    let req = Request::decode(&f).unwrap();
    let r = ncsi::responder::response(&config(), &req);
    assert_eq!(r.code(), RspCode::Unsupported);
    assert_eq!(r.reason(), Reason::Unknown);
    assert_eq!(r.payload_len(), 0);
}

#[test]
fn unknown_command() {
    // including response types, which match entries once flagged
    for typ in [0x0f, 0x1c, 0x4f, 0x53, 0x7f, 0x8a, 0xd0, 0xff] {
        let f = cmd(typ, 0x44, 0x02, &[]);
        let rsp = single(&f);
        assert_eq!(rsp[18], typ | 0x80);
        assert_eq!(rsp[17], 0x44);
        assert_eq!(rsp[19], 0x02);
        assert_eq!(payload_len(&rsp), 0);
        check_checksum(&rsp);

        let req = Request::decode(&f).unwrap();
        let r = ncsi::responder::response(&config(), &req);
        assert_eq!(r.code(), RspCode::Unavailable);
        assert_eq!(r.reason(), Reason::Unknown);
    }
}

#[test]
fn dropped_frames() {
    // too short for ethernet
    assert!(exchange(config(), &[0x88; 13]).is_empty());

    // not NC-SI
    let mut f = cmd(0x0a, 0x01, 0x00, &[]);
    f[12..14].copy_from_slice(&[0x08, 0x00]);
    assert!(exchange(config(), &f).is_empty());

    // NC-SI, but no room for the header
    let f = cmd(0x0a, 0x01, 0x00, &[]);
    assert!(exchange(config(), &f[..29]).is_empty());

    // header only, no padding
    assert_eq!(exchange(config(), &f[..30]).len(), 1);
}

#[test]
fn in_order() {
    start_log();
    let mut session = Session::new(config(), Capture::default());
    for iid in 1..=5u8 {
        session.handle_frame(&cmd(0x0a, iid, 0x00, &[]));
    }
    let iids: Vec<u8> = session.transmitter().0.iter().map(|r| r[17]).collect();
    assert_eq!(iids, [1, 2, 3, 4, 5]);
}

#[test]
fn transmit_failure_ignored() {
    start_log();
    let mut session = Session::new(config(), Broken);
    session.handle_frame(&cmd(0x00, 0x01, 0x00, &[]));
    session.handle_frame(&cmd(0x0a, 0x02, 0x00, &[]));
    assert_eq!(session.config().mfr_id, 0x8119);
}
