use std::net::Ipv6Addr;

use nix::unistd::getpid;
use pnet::packet::icmpv6::{self, Icmpv6Code, Icmpv6Packet, Icmpv6Type, MutableIcmpv6Packet};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv6::{Ipv6Packet, MutableIpv6Packet};
use pnet::packet::MutablePacket;
use thiserror::Error;

/// Type 6 is not assigned in the ICMPv6 parameter registry.
pub const UNKNOWN_TYPE: Icmpv6Type = Icmpv6Type(6);
pub const UNKNOWN_CODE: Icmpv6Code = Icmpv6Code(0);
pub const MESSAGE_BODY: &[u8; 16] = b"ABCDEFGHIJKLMNOP";
pub const HOP_LIMIT: u8 = 64;

pub const IPV6_HEADER_LEN: usize = Ipv6Packet::minimum_packet_size();
pub const ICMPV6_HEADER_LEN: usize = Icmpv6Packet::minimum_packet_size();
pub const ICMPV6_LEN: usize = ICMPV6_HEADER_LEN + MESSAGE_BODY.len();
pub const PACKET_LEN: usize = IPV6_HEADER_LEN + ICMPV6_LEN;

#[derive(Error, Debug)]
pub enum PacketError {
    #[error("buffer of {actual} bytes too small for {layer}, need at least {required}")]
    BufferTooSmall {
        layer: &'static str,
        actual: usize,
        required: usize,
    },
}

/// Echo identifier in the style of the echo-request tests, derived from the process id.
/// Messages of unknown type carry no identifier, so this only ends up in the logs.
pub fn echo_identifier() -> u16 {
    (getpid().as_raw() & 0xffff) as u16
}

/// Serializes an IPv6 packet from `addr6` to itself, carrying an ICMPv6 message of
/// [UNKNOWN_TYPE] with [MESSAGE_BODY]. Output depends on nothing but `addr6`.
pub fn build_unknown_to_self(addr6: Ipv6Addr) -> Result<Vec<u8>, PacketError> {
    let mut buf = vec![0u8; PACKET_LEN];

    let mut ip = MutableIpv6Packet::new(&mut buf).ok_or(PacketError::BufferTooSmall {
        layer: "IPv6 header",
        actual: PACKET_LEN,
        required: IPV6_HEADER_LEN,
    })?;
    ip.set_version(6);
    ip.set_traffic_class(0);
    ip.set_flow_label(0);
    ip.set_payload_length(ICMPV6_LEN as u16);
    ip.set_next_header(IpNextHeaderProtocols::Icmpv6);
    ip.set_hop_limit(HOP_LIMIT);
    ip.set_source(addr6);
    ip.set_destination(addr6);

    write_unknown_icmpv6(ip.payload_mut(), addr6, addr6)?;
    Ok(buf)
}

fn write_unknown_icmpv6(
    buf: &mut [u8],
    source: Ipv6Addr,
    destination: Ipv6Addr,
) -> Result<(), PacketError> {
    let actual = buf.len();
    let mut icmp = MutableIcmpv6Packet::new(buf).ok_or(PacketError::BufferTooSmall {
        layer: "ICMPv6 message",
        actual,
        required: ICMPV6_LEN,
    })?;
    icmp.set_icmpv6_type(UNKNOWN_TYPE);
    icmp.set_icmpv6_code(UNKNOWN_CODE);
    icmp.set_payload(MESSAGE_BODY);
    // checksum field is still zero here, as required for computing it
    let checksum = icmpv6::checksum(&icmp.to_immutable(), &source, &destination);
    icmp.set_checksum(checksum);
    Ok(())
}
