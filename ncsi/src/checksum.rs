// SPDX-License-Identifier: MIT OR Apache-2.0
/*
 * NC-SI packet checksum.
 *
 * Copyright (c) 2025 Code Construct
 */

//! NC-SI optional packet checksum.
//!
//! The checksum is the two's complement of the 32-bit sum of the packet
//! header and payload, taken as big-endian 16-bit words. A trailing odd byte
//! is summed as if followed by a zero byte; packets we generate are always
//! even-length.

fn sum(data: &[u8]) -> u32 {
    data.chunks(2).fold(0u32, |acc, w| {
        let hi = w[0];
        let lo = w.get(1).copied().unwrap_or(0);
        acc.wrapping_add(u16::from_be_bytes([hi, lo]) as u32)
    })
}

/// Calculate the checksum over an NC-SI header and payload
pub fn calculate(data: &[u8]) -> u32 {
    (!sum(data)).wrapping_add(1)
}

/// Check `checksum` against an NC-SI header and payload.
///
/// A zero checksum means the sender did not provide one, and always
/// verifies.
pub fn verify(data: &[u8], checksum: u32) -> bool {
    checksum == 0 || sum(data).wrapping_add(checksum) == 0
}
