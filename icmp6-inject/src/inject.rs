use log::trace;
use pcap::{Active, Capture};
use thiserror::Error;

/// Destination for fully framed packets. Each call must put exactly one frame on the wire.
pub trait FrameSink {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), InjectError>;
}

#[derive(Error, Debug)]
pub enum InjectError {
    #[error("failed to open interface `{interface}` for injection")]
    Open {
        interface: String,
        source: pcap::Error,
    },

    #[error("failed to inject {len} bytes on interface `{interface}`")]
    Send {
        interface: String,
        len: usize,
        source: pcap::Error,
    },
}

/// Writes frames verbatim to an interface through libpcap, i.e. the BPF device on BSDs.
/// Needs root or equivalent capabilities.
pub struct PcapSink {
    interface: String,
    capture: Capture<Active>,
}

impl PcapSink {
    pub fn open(interface: &str) -> Result<Self, InjectError> {
        let capture = Capture::from_device(interface)
            .and_then(|inactive| inactive.open())
            .map_err(|source| InjectError::Open {
                interface: interface.to_string(),
                source,
            })?;
        trace!("Opened {} for injection", interface);
        Ok(PcapSink {
            interface: interface.to_string(),
            capture,
        })
    }
}

impl FrameSink for PcapSink {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), InjectError> {
        self.capture
            .sendpacket(frame)
            .map_err(|source| InjectError::Send {
                interface: self.interface.clone(),
                len: frame.len(),
                source,
            })
    }
}
