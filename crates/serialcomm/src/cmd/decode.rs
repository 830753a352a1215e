use serialcomm_frame::{DecoderState, ReceiverConfig};
use serialcomm_link::{open_with_config, LinkConfig};
use serialcomm_transport::MemoryPort;

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{io_error, link_error, CliResult, SUCCESS};
use crate::output::{print_decoded, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = match (&args.hex, &args.file) {
        (Some(hex), _) => parse_hex(hex)?,
        (None, Some(path)) => std::fs::read(path)
            .map_err(|err| io_error(&format!("read {}", path.display()), err))?,
        (None, None) => Vec::new(),
    };

    let config = LinkConfig {
        receiver: ReceiverConfig {
            high_water_mark: args.high_water_mark,
            store_capacity: args.capacity,
        },
    };
    let port = MemoryPort::new();
    let line = port.clone();
    let mut link = open_with_config(port, config).map_err(|err| link_error("decode", err))?;

    let chunk = usize::try_from(args.chunk).unwrap_or(usize::MAX);
    for piece in input.chunks(chunk) {
        line.inject(piece);
        link.process(usize::MAX)
            .map_err(|err| link_error("decode", err))?;
    }

    if link.receiver_state() != DecoderState::Idle {
        tracing::warn!(state = ?link.receiver_state(), "input ended inside a frame");
    }

    let drained = link.store().drain_all();
    print_decoded(input.len(), &drained, link.stats(), format);
    Ok(SUCCESS)
}
