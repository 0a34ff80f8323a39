use std::{
    collections::BTreeMap,
    fs,
    net::{AddrParseError, Ipv6Addr},
    path::PathBuf,
};

use clap::Args;
use itertools::Itertools;
use log::trace;
use thiserror::Error;

const INTERFACE_PREFIX: &str = "IF_";
const ADDRESS6_PREFIX: &str = "ADDR6_";

#[derive(Args, Clone, Debug)]
#[group(id = "addr")]
pub struct Params {
    /// File with the test network configuration, as generated by the regress Makefile.
    /// One `NAME="value"` assignment per line, e.g. `IF_1="lo0"` and `ADDR6_1="fe80::1"`.
    /// # at start of line to comment out the whole line
    #[arg(long, value_name = "FILE", default_value = "addr.py", env = "ADDR_FILE")]
    pub addr_file: PathBuf,
}

/// Interface and address selected by a test configuration index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestConfig {
    pub index: String,
    pub interface: String,
    pub addr6: Ipv6Addr,
}

/// Name-to-value assignments of the test network configuration.
#[derive(Debug, Default)]
pub struct AddrTable {
    entries: BTreeMap<String, String>,
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("address file does not exist: `{0}`")]
    NoSuchFile(PathBuf),

    #[error("failed to read address file `{path}`")]
    FailedRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no interface `IF_{0}` configured")]
    MissingInterface(String),

    #[error("no address `ADDR6_{0}` configured")]
    MissingAddress(String),

    #[error("invalid IPv6 address for `ADDR6_{index}`: `{value}`")]
    AddressSyntax {
        index: String,
        value: String,
        source: AddrParseError,
    },
}

impl AddrTable {
    pub fn read(params: &Params) -> Result<Self, LookupError> {
        use LookupError as E;

        let path = &params.addr_file;
        if !path.is_file() {
            return Err(E::NoSuchFile(path.clone()));
        }
        let content = fs::read_to_string(path).map_err(|source| E::FailedRead {
            path: path.clone(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();
        let lines = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));
        for line in lines {
            match parse_assignment(line) {
                Some((name, value)) => {
                    entries.insert(name.to_string(), value.to_string());
                }
                None => trace!("Skipping non-assignment line in address file: {}", line),
            }
        }
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// All configuration indices that have an interface assigned, in file-independent order.
    pub fn indices(&self) -> Vec<&str> {
        self.entries
            .keys()
            .filter_map(|name| name.strip_prefix(INTERFACE_PREFIX))
            .filter(|index| !index.is_empty())
            .collect_vec()
    }

    pub fn resolve(&self, index: &str) -> Result<TestConfig, LookupError> {
        use LookupError as E;

        let interface = self
            .get(&format!("{}{}", INTERFACE_PREFIX, index))
            .ok_or_else(|| E::MissingInterface(index.to_string()))?;
        let raw_addr = self
            .get(&format!("{}{}", ADDRESS6_PREFIX, index))
            .ok_or_else(|| E::MissingAddress(index.to_string()))?;
        let addr6 = parse_addr6(raw_addr).map_err(|source| E::AddressSyntax {
            index: index.to_string(),
            value: raw_addr.to_string(),
            source,
        })?;

        Ok(TestConfig {
            index: index.to_string(),
            interface: interface.to_string(),
            addr6,
        })
    }
}

fn parse_assignment(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once('=')?;
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, unquote(value.trim().trim_end_matches(';').trim_end())))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Link-local addresses may carry a zone (`fe80::1%lo0`), which is not part of the wire address.
fn parse_addr6(raw: &str) -> Result<Ipv6Addr, AddrParseError> {
    let without_zone = raw.split_once('%').map_or(raw, |(addr, _zone)| addr);
    without_zone.parse()
}
