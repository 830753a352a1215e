use bytes::BytesMut;
use serialcomm_frame::{encode_frame, Message, MessageKind};

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, CliError, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let message = parse_message(args.kind, &args.value)?;

    let mut frame = BytesMut::new();
    encode_frame(&message, &mut frame).map_err(|err| frame_error("encode", err))?;
    tracing::debug!(kind = %args.kind, bytes = frame.len(), "encoded frame");

    print_frame(&message, &frame, format);
    Ok(SUCCESS)
}

/// Build a message of `kind` from its command-line spelling.
pub fn parse_message(kind: MessageKind, value: &str) -> CliResult<Message> {
    let invalid = |err: &dyn std::fmt::Display| {
        CliError::data_invalid(format!("invalid {kind} value {value:?}: {err}"))
    };
    let float = || value.parse::<f32>().map_err(|e| invalid(&e));

    let message = match kind {
        MessageKind::Debug => Message::Debug(value.to_string()),
        MessageKind::Error => Message::Error(value.to_string()),
        MessageKind::Timestamp => Message::Timestamp(value.parse().map_err(|e| invalid(&e))?),
        MessageKind::PowerSetting => Message::PowerSetting(
            parse_switch(value).ok_or_else(|| invalid(&"expected on/off, true/false or 0/1"))?,
        ),
        MessageKind::ThrottleSetting => {
            Message::ThrottleSetting(value.parse().map_err(|e| invalid(&e))?)
        }
        MessageKind::MaxCurrent => Message::MaxCurrent(float()?),
        MessageKind::MaxVoltage => Message::MaxVoltage(float()?),
        MessageKind::Thrust => Message::Thrust(float()?),
        MessageKind::RotSpeed => Message::RotSpeed(float()?),
        MessageKind::Current => Message::Current(float()?),
        MessageKind::Voltage => Message::Voltage(float()?),
    };
    Ok(message)
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "on" | "true" => Some(true),
        "0" | "off" | "false" => Some(false),
        _ => None,
    }
}
