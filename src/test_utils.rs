use std::io::Write;
use std::net::Ipv6Addr;

use tempfile::NamedTempFile;

pub fn addr(input: &str) -> Ipv6Addr {
    input.parse().expect(input)
}

/// File is deleted once the returned handle is dropped.
pub fn write_temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file to be creatable");
    file.write_all(content.as_bytes())
        .expect("temp file to be writable");
    file
}
