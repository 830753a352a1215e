use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serialcomm_frame::{Message, MessageKind, ReceiverStats};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    kind: &'static str,
    code: String,
    message: &'a Message,
    frame: String,
    length: usize,
    checksum: String,
}

/// Print one encoded frame.
pub fn print_frame(message: &Message, frame: &[u8], format: OutputFormat) {
    let kind = message.kind();
    let checksum = frame.last().copied().unwrap_or_default();
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                kind: kind.name(),
                code: format!("0x{:02X}", kind.code()),
                message,
                frame: hex::encode_upper(frame),
                length: frame.len(),
                checksum: format!("0x{checksum:02X}"),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "CODE", "VALUE", "FRAME", "LRC"])
                .add_row(vec![
                    kind.name().to_string(),
                    format!("0x{:02X}", kind.code()),
                    value_text(message),
                    spaced_hex(frame),
                    format!("0x{checksum:02X}"),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", spaced_hex(frame)),
        OutputFormat::Raw => print_raw(frame),
    }
}

#[derive(Serialize)]
struct StatsOutput {
    frames_decoded: u64,
    frames_dropped: u64,
    checksum_failures: u64,
    unknown_types: u64,
    invalid_payloads: u64,
    noise_bytes: u64,
    overflow_flushes: u64,
    bytes_flushed: u64,
}

impl From<ReceiverStats> for StatsOutput {
    fn from(stats: ReceiverStats) -> Self {
        Self {
            frames_decoded: stats.frames_decoded,
            frames_dropped: stats.frames_dropped(),
            checksum_failures: stats.checksum_failures,
            unknown_types: stats.unknown_types,
            invalid_payloads: stats.invalid_payloads,
            noise_bytes: stats.noise_bytes,
            overflow_flushes: stats.overflow_flushes,
            bytes_flushed: stats.bytes_flushed,
        }
    }
}

#[derive(Serialize)]
struct DecodeOutput<'a> {
    input_bytes: usize,
    messages: Vec<&'a Message>,
    stats: StatsOutput,
}

/// Print what a decode run left in the store, grouped by kind in tag order.
pub fn print_decoded(
    input_bytes: usize,
    drained: &[(MessageKind, Vec<Message>)],
    stats: ReceiverStats,
    format: OutputFormat,
) {
    let messages = drained.iter().flat_map(|(_, messages)| messages);
    match format {
        OutputFormat::Json => {
            let out = DecodeOutput {
                input_bytes,
                messages: messages.collect(),
                stats: stats.into(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "VALUE"]);
            for message in messages {
                table.add_row(vec![message.kind().name().to_string(), value_text(message)]);
            }
            println!("{table}");
            println!(
                "decoded={} dropped={} noise={} flushed={}",
                stats.frames_decoded,
                stats.frames_dropped(),
                stats.noise_bytes,
                stats.bytes_flushed
            );
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for message in messages {
                println!("{}={}", message.kind(), value_text(message));
            }
        }
    }
}

#[derive(Serialize)]
struct ChecksumOutput {
    payload: String,
    length: usize,
    checksum: String,
}

pub fn print_checksum(payload: &[u8], lrc: u8, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&ChecksumOutput {
            payload: hex::encode_upper(payload),
            length: payload.len(),
            checksum: format!("0x{lrc:02X}"),
        }),
        OutputFormat::Table | OutputFormat::Pretty => println!("0x{lrc:02X}"),
        OutputFormat::Raw => print_raw(&[lrc]),
    }
}

#[derive(Serialize)]
struct KindOutput {
    name: &'static str,
    code: String,
    payload: &'static str,
}

/// Print the kind table: names, type tags, payload layouts.
pub fn print_kinds(format: OutputFormat) {
    let rows: Vec<KindOutput> = MessageKind::ALL
        .iter()
        .map(|kind| KindOutput {
            name: kind.name(),
            code: format!("0x{:02X}", kind.code()),
            payload: shape_text(*kind),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "CODE", "PAYLOAD"]);
            for row in rows {
                table.add_row(vec![row.name.to_string(), row.code, row.payload.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in rows {
                println!("{} {} {}", row.code, row.name, row.payload);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Human-readable value of a message, without its kind.
pub fn value_text(message: &Message) -> String {
    match message {
        Message::Debug(text) | Message::Error(text) => text.clone(),
        Message::Timestamp(value) => value.to_string(),
        Message::PowerSetting(on) => (if *on { "on" } else { "off" }).to_string(),
        Message::ThrottleSetting(percent) => format!("{percent}%"),
        Message::MaxCurrent(value)
        | Message::MaxVoltage(value)
        | Message::Thrust(value)
        | Message::RotSpeed(value)
        | Message::Current(value)
        | Message::Voltage(value) => value.to_string(),
    }
}

fn shape_text(kind: MessageKind) -> &'static str {
    match kind.shape() {
        serialcomm_frame::PayloadShape::Text => "u16 BE length + UTF-8",
        serialcomm_frame::PayloadShape::I32Be => "i32 BE",
        serialcomm_frame::PayloadShape::I16Be => "i16 BE",
        serialcomm_frame::PayloadShape::F32Le => "f32 LE",
    }
}

pub fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_text_per_kind() {
        assert_eq!(value_text(&Message::PowerSetting(true)), "on");
        assert_eq!(value_text(&Message::ThrottleSetting(40)), "40%");
        assert_eq!(value_text(&Message::Timestamp(-3)), "-3");
        assert_eq!(value_text(&Message::Voltage(3.5)), "3.5");
        assert_eq!(value_text(&Message::Debug("hi".to_string())), "hi");
    }

    #[test]
    fn spaced_hex_is_upper_case() {
        assert_eq!(spaced_hex(&[0x21, 0x32, 0x2b]), "21 32 2B");
        assert_eq!(spaced_hex(&[]), "");
    }
}
