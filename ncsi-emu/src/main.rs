// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * NC-SI network controller emulator.
 *
 * Copyright (c) 2025 Code Construct
 */
#[allow(unused)]
use log::{debug, error, info, trace, warn};

use anyhow::{Context, Result};

use std::thread;
use std::time::Duration;

use argh::FromArgs;
use ncsi::{Config, MacAddr, NcsiError, Session};
use ncsi_linux::{PacketSocket, RECV_BUF_LEN};

#[derive(FromArgs, Debug)]
#[argh(description = "NC-SI network controller emulator")]
struct Args {
    #[argh(switch, short = 'd')]
    /// debug logging
    debug: bool,

    #[argh(switch)]
    /// trace logging
    trace: bool,

    /// emulated manufacturer IANA ID, decimal or 0x-prefixed hex
    #[argh(
        option,
        from_str_fn(parse_mfr_id),
        default = "ncsi::proto::MFR_ID_MLX"
    )]
    mfr_id: u32,

    /// emulated MAC address
    #[argh(option, default = "ncsi::DEFAULT_MAC")]
    mac: MacAddr,

    /// network interface
    #[argh(positional)]
    interface: String,
}

fn parse_mfr_id(s: &str) -> std::result::Result<u32, String> {
    let r = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    r.map_err(|e| format!("bad manufacturer ID '{s}': {e}"))
}

const MAX_BACKOFF_MS: u64 = 1000;
/// Receive failures between repeated warnings
const WARN_INTERVAL: u32 = 100;

/// Delay before retrying after `failures` consecutive receive errors
fn recv_backoff(failures: u32) -> Duration {
    let ms = 10u64 << failures.saturating_sub(1).min(7);
    Duration::from_millis(ms.min(MAX_BACKOFF_MS))
}

/// Whether a run of `failures` consecutive receive errors is reported at
/// warn level, rather than debug
fn recv_warn(failures: u32) -> bool {
    failures == 1 || failures % WARN_INTERVAL == 0
}

fn serve(session: &mut Session<PacketSocket>) -> ! {
    let mut buf = [0u8; RECV_BUF_LEN];
    let mut failures = 0u32;

    loop {
        let len = match session.transmitter().recv_ncsi(&mut buf) {
            Ok(l) => l,
            Err(e @ NcsiError::Oversize(_)) => {
                warn!("Dropping NC-SI frame: {e}");
                continue;
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                if recv_warn(failures) {
                    warn!("receive failed ({failures} in a row): {e}");
                } else {
                    debug!("receive failed ({failures} in a row): {e}");
                }
                thread::sleep(recv_backoff(failures));
                continue;
            }
        };

        if failures > 0 {
            info!("receive recovered after {failures} failures");
            failures = 0;
        }

        session.handle_frame(&buf[..len]);
    }
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let level = if args.trace {
        log::LevelFilter::Trace
    } else if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    let ifindex = ncsi_linux::interface_index(&args.interface)
        .with_context(|| format!("Unknown interface {}", args.interface))?;

    let sock = PacketSocket::new().context("Failed to create socket")?;
    sock.bind(ifindex)
        .with_context(|| format!("Failed to bind to {}", args.interface))?;

    let config = Config {
        mfr_id: args.mfr_id,
        ncsi_mac: args.mac,
    };

    info!(
        "Emulating NC-SI on {} (ifindex {ifindex}), manufacturer 0x{:x}, MAC {}",
        args.interface, config.mfr_id, config.ncsi_mac
    );

    let mut session = Session::new(config, sock);
    serve(&mut session)
}
