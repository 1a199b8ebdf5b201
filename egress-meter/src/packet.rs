//! Destination-address extraction from raw link-layer frames.
//!
//! The probe observes Ethernet frames carrying IPv4, so the destination
//! address sits at a fixed offset: 14 bytes of Ethernet header plus 16
//! bytes into the IPv4 header. Extraction is a pure function of the
//! frame bytes; no parsing or validation of the surrounding headers is
//! performed, and a malformed frame that is long enough simply yields a
//! garbage address that gets accounted like any other.

use std::net::Ipv4Addr;

use thiserror::Error;

/// Length of an Ethernet header without VLAN tags.
pub const ETH_HDR_LEN: usize = 14;

/// Offset of the destination address field within the IPv4 header.
pub const IPV4_DST_OFFSET: usize = 16;

/// Offset of the destination address field from the start of the frame.
pub const DST_ADDR_OFFSET: usize = ETH_HDR_LEN + IPV4_DST_OFFSET;

/// Errors occurring while reading fields out of a frame
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The frame ended before the field being read
    #[error("truncated frame: {len} bytes, need at least {needed}")]
    TruncatedFrame {
        /// Bytes available in the frame
        len: usize,
        /// Bytes required to complete the read
        needed: usize,
    },
}

/// Reads the IPv4 destination address out of `frame`.
///
/// The read is bounds checked: a frame shorter than
/// [`DST_ADDR_OFFSET`]` + 4` bytes yields
/// [`FrameError::TruncatedFrame`] rather than reading past the end.
/// Callers are expected to skip accounting for such frames and still
/// pass them through.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
///
/// use egress_meter::packet::extract_destination;
///
/// let mut frame = [0u8; 64];
/// frame[30..34].copy_from_slice(&[10, 0, 0, 7]);
/// assert_eq!(extract_destination(&frame), Ok(Ipv4Addr::new(10, 0, 0, 7)));
/// ```
pub fn extract_destination(frame: &[u8]) -> Result<Ipv4Addr, FrameError> {
    let needed = DST_ADDR_OFFSET + 4;
    if frame.len() < needed {
        return Err(FrameError::TruncatedFrame {
            len: frame.len(),
            needed,
        });
    }
    let octets = &frame[DST_ADDR_OFFSET..needed];
    Ok(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn frame_to(dst: Ipv4Addr, len: usize) -> Vec<u8> {
        let mut frame = vec![0u8; len];
        frame[DST_ADDR_OFFSET..DST_ADDR_OFFSET + 4].copy_from_slice(&dst.octets());
        frame
    }

    #[test]
    fn extracts_destination_at_fixed_offset() {
        let frame = frame_to(Ipv4Addr::new(192, 0, 2, 33), 1500);
        assert_eq!(
            extract_destination(&frame),
            Ok(Ipv4Addr::new(192, 0, 2, 33))
        );
    }

    #[test]
    fn minimum_frame_length_is_offset_plus_field() {
        let frame = frame_to(Ipv4Addr::new(203, 0, 113, 9), DST_ADDR_OFFSET + 4);
        assert_eq!(
            extract_destination(&frame),
            Ok(Ipv4Addr::new(203, 0, 113, 9))
        );
    }

    #[test]
    fn truncated_frame_is_rejected() {
        let frame = vec![0u8; DST_ADDR_OFFSET + 3];
        assert_matches!(
            extract_destination(&frame),
            Err(FrameError::TruncatedFrame { len: 33, needed: 34 })
        );
    }

    #[test]
    fn empty_frame_is_rejected() {
        assert_matches!(
            extract_destination(&[]),
            Err(FrameError::TruncatedFrame { len: 0, needed: 34 })
        );
    }

    #[test]
    fn zeroed_frame_yields_the_zero_address() {
        // Non-IP traffic long enough to read from is not detected; its
        // bytes are accounted under whatever address they spell.
        let frame = vec![0u8; 64];
        assert_eq!(extract_destination(&frame), Ok(Ipv4Addr::UNSPECIFIED));
    }
}
