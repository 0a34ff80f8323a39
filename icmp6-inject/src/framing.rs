use clap::Args;

/// Address family value the BPF loopback link type expects in front of IPv6 packets.
pub const BPF_LOOPBACK_AF_INET6: u32 = 24;

#[derive(Args, Clone, Debug)]
#[group(id = "framing")]
pub struct Params {
    /// Link-layer family written as 4-byte big-endian prefix in front of the packet.
    /// Injecting on loopback/null links needs this instead of an Ethernet header
    #[arg(long, value_name = "AF", default_value_t = BPF_LOOPBACK_AF_INET6)]
    pub link_family: u32,

    /// Send the bare IPv6 packet without any link-layer prefix
    #[arg(long, conflicts_with = "link_family")]
    pub no_link_header: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFraming {
    Family(u32),
    None,
}

impl From<&Params> for LinkFraming {
    fn from(params: &Params) -> Self {
        if params.no_link_header {
            LinkFraming::None
        } else {
            LinkFraming::Family(params.link_family)
        }
    }
}

impl LinkFraming {
    pub fn header_len(&self) -> usize {
        match self {
            LinkFraming::Family(_) => 4,
            LinkFraming::None => 0,
        }
    }

    pub fn apply(&self, packet: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.header_len() + packet.len());
        if let LinkFraming::Family(family) = self {
            frame.extend_from_slice(&family.to_be_bytes());
        }
        frame.extend_from_slice(packet);
        frame
    }
}
