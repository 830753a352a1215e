use serialcomm_frame::checksum;

use crate::cmd::{parse_hex, ChecksumArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_checksum, OutputFormat};

pub fn run(args: ChecksumArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = parse_hex(&args.hex)?;
    print_checksum(&payload, checksum(&payload), format);
    Ok(SUCCESS)
}
