use anyhow::{Context, Result};
use clap::Args;
use itertools::Itertools;
use log::Level::Debug;
use log::{debug, info, log_enabled};
use pf_regress::addr::{self, AddrTable};

use crate::framing::{self, LinkFraming};
use crate::inject::{FrameSink, InjectError, PcapSink};
use crate::packet;

#[derive(Args)]
#[group(id = "injection")]
pub struct Params {
    #[clap(flatten)]
    addr: addr::Params,

    #[clap(flatten)]
    framing: framing::Params,

    /// Build the frame and log it, but do not open the interface
    #[arg(long)]
    dry_run: bool,

    /// Test configuration index; selects `IF_<N>` and `ADDR6_<N>` from the address file
    #[arg(value_name = "N")]
    index: String,
}

pub fn handle(params: Params) -> Result<()> {
    let table = AddrTable::read(&params.addr)
        .with_context(|| "Unable to load test network configuration")?;
    run(&params, &table, PcapSink::open)
}

/// Resolves the configuration, then builds and sends one frame. The sink is only opened
/// once the frame is complete, so a failure before that leaves the wire untouched.
pub fn run<S, F>(params: &Params, table: &AddrTable, open_sink: F) -> Result<()>
where
    S: FrameSink,
    F: FnOnce(&str) -> Result<S, InjectError>,
{
    let config = table.resolve(&params.index).with_context(|| {
        format!(
            "Unknown test configuration {:?}, known are: {}",
            params.index,
            table.indices().join(", ")
        )
    })?;
    debug!("Resolved test configuration: {:?}", config);
    debug!(
        "Echo identifier {:#06x} (not used by this message type)",
        packet::echo_identifier()
    );

    let bytes = packet::build_unknown_to_self(config.addr6)
        .with_context(|| format!("Failed to build packet for {}", config.addr6))?;
    let framing = LinkFraming::from(&params.framing);
    let frame = framing.apply(&bytes);
    if log_enabled!(Debug) {
        let hex = frame.iter().map(|byte| format!("{:02x}", byte)).join(" ");
        debug!("Frame ({:?}, {} bytes): {}", framing, frame.len(), hex);
    }

    if params.dry_run {
        info!("Dry run, not sending to {}", config.interface);
        return Ok(());
    }

    let mut sink = open_sink(config.interface.as_str())
        .with_context(|| "If not running as root, you might need to re-run with doas/sudo.")?;
    sink.send_frame(&frame)?;
    info!(
        "Sent ICMPv6 type {} to {} on {}",
        packet::UNKNOWN_TYPE.0,
        config.addr6,
        config.interface
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    use assertor::*;

    use crate::framing::BPF_LOOPBACK_AF_INET6;
    use crate::test_utils::addr;

    use super::*;

    const TABLE: &str = "IF_1=\"lo0\"\nADDR6_1=\"fe80::1\"\nIF_2=\"vether0\"\n";

    #[derive(Clone, Default)]
    struct RecordingSink {
        frames: Rc<RefCell<Vec<Vec<u8>>>>,
    }

    impl FrameSink for RecordingSink {
        fn send_frame(&mut self, frame: &[u8]) -> Result<(), InjectError> {
            self.frames.borrow_mut().push(frame.to_vec());
            Ok(())
        }
    }

    fn params_for(index: &str) -> Params {
        Params {
            addr: addr::Params {
                addr_file: PathBuf::from("addr.py"),
            },
            framing: framing::Params {
                link_family: BPF_LOOPBACK_AF_INET6,
                no_link_header: false,
            },
            dry_run: false,
            index: index.to_string(),
        }
    }

    fn run_recording(params: &Params) -> (Result<()>, Vec<String>, Vec<Vec<u8>>) {
        let table = AddrTable::parse(TABLE);
        let sink = RecordingSink::default();
        let opened = RefCell::new(vec![]);
        let res = run(params, &table, |interface| {
            opened.borrow_mut().push(interface.to_string());
            Ok(sink.clone())
        });
        let frames = sink.frames.borrow().clone();
        (res, opened.into_inner(), frames)
    }

    #[test]
    fn sends_exactly_one_loopback_frame() {
        // given
        let params = params_for("1");
        // when
        let (res, opened, frames) = run_recording(&params);
        // then
        assert_that!(res).is_ok();
        assert_that!(opened).is_equal_to(vec!["lo0".to_string()]);
        assert_that!(frames).has_length(1);
        let frame = &frames[0];
        assert_that!(frame.len()).is_equal_to(64);
        assert_that!(frame[..4].to_vec()).is_equal_to(vec![0x00, 0x00, 0x00, 0x18]);
        assert_that!(frame[4..].to_vec())
            .is_equal_to(packet::build_unknown_to_self(addr("fe80::1")).unwrap());
    }

    #[test]
    fn repeated_runs_send_identical_frames() {
        // given
        let params = params_for("1");
        // when
        let (_, _, first) = run_recording(&params);
        let (_, _, second) = run_recording(&params);
        // then
        assert_that!(first).is_equal_to(second);
    }

    #[test]
    fn unknown_index_never_opens_interface() {
        // given
        let params = params_for("9");
        // when
        let (res, opened, frames) = run_recording(&params);
        // then
        assert_that!(res).is_err();
        assert_that!(opened).has_length(0);
        assert_that!(frames).has_length(0);
    }

    #[test]
    fn missing_address_never_opens_interface() {
        // given
        let params = params_for("2");
        // when
        let (res, opened, _) = run_recording(&params);
        // then
        assert_that!(res).is_err();
        assert_that!(opened).has_length(0);
    }

    #[test]
    fn dry_run_never_opens_interface() {
        // given
        let mut params = params_for("1");
        params.dry_run = true;
        // when
        let (res, opened, frames) = run_recording(&params);
        // then
        assert_that!(res).is_ok();
        assert_that!(opened).has_length(0);
        assert_that!(frames).has_length(0);
    }

    #[test]
    fn bare_packet_without_link_header() {
        // given
        let mut params = params_for("1");
        params.framing.no_link_header = true;
        // when
        let (_, _, frames) = run_recording(&params);
        // then
        assert_that!(frames).has_length(1);
        assert_that!(frames[0].len()).is_equal_to(packet::PACKET_LEN);
        assert_that!(frames[0][0] >> 4).is_equal_to(6);
    }
}
