use std::net::Ipv6Addr;

pub fn addr(input: &str) -> Ipv6Addr {
    input.parse().expect(input)
}
