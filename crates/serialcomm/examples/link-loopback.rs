//! Host and simulated device talking over an in-memory null-modem pair.
//!
//! Run with:
//!   cargo run --example link-loopback
//!
//! The host sends settings, the device answers with telemetry, and both sides
//! drain their stores.

use std::thread;
use std::time::Duration;

use serialcomm::frame::{Message, MessageKind};
use serialcomm::link::open;
use serialcomm::transport::MemoryPort;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (host_port, device_port) = MemoryPort::pair();
    let mut host = open(host_port)?;
    let mut device = open(device_port)?;

    let device_thread = thread::spawn(move || -> serialcomm::link::Result<()> {
        let mut rpm = 0.0f32;
        loop {
            device.process(16)?;
            for message in device.store().drain(MessageKind::ThrottleSetting) {
                if let Message::ThrottleSetting(percent) = message {
                    rpm = f32::from(percent) * 60.0;
                    device.send_debug(format!("throttle set to {percent}%"))?;
                }
            }
            let power = device.store().latest(MessageKind::PowerSetting);
            if let Some(Message::PowerSetting(false)) = power {
                device.send_error("powered down")?;
                return Ok(());
            }
            device.send(&Message::RotSpeed(rpm))?;
            thread::sleep(Duration::from_millis(20));
        }
    });

    host.send_power_setting(true)?;
    host.send_max_current(15.0)?;
    host.send_throttle_setting(40)?;
    thread::sleep(Duration::from_millis(100));
    host.send_power_setting(false)?;

    match device_thread.join() {
        Ok(result) => result?,
        Err(_) => return Err("device thread panicked".into()),
    }

    host.process(usize::MAX)?;
    for (kind, messages) in host.store().drain_all() {
        eprintln!(
            "{kind}: {} message(s), latest {:?}",
            messages.len(),
            messages.last()
        );
    }
    eprintln!("host stats: {:?}", host.stats());
    Ok(())
}
