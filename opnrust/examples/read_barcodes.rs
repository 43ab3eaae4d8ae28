//! Identify the scanner, sync its clock and download stored barcodes
//!
//! Set `OPN_PORT` to the cradle's serial port, or `OPN_REPLAY` to a file of
//! captured device bytes to run without hardware.

use opnrust::{DeviceParameter, MemoryTransport, Scanner, SerialConfig, SerialTransport, Transport};
use tracing_subscriber::EnvFilter;

fn main() -> opnrust::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let transport: Box<dyn Transport> = match std::env::var("OPN_REPLAY") {
        Ok(path) => {
            let captured = std::fs::read(&path).map_err(io_error)?;
            println!("Replaying {} bytes from {}", captured.len(), path);
            Box::new(MemoryTransport::with_input(captured))
        }
        Err(_) => Box::new(SerialTransport::new(SerialConfig::from_env()?)),
    };

    let mut scanner = Scanner::new(transport);

    scanner.connect()?;
    println!("✓ Connected to {}", scanner.transport().port_name());

    let info = scanner.interrogate()?;
    println!("✓ Scanner: {}", info);

    let now = scanner.sync_clock()?;
    println!("✓ Clock set to {}", now);

    let ascii = scanner.get_param(DeviceParameter::AsciiMode)?;
    println!("✓ {}: {}", DeviceParameter::AsciiMode, ascii);

    let data = scanner.get_data()?;
    println!("✓ {} barcodes", data.barcodes.len());
    for barcode in &data.barcodes {
        println!("  {}", barcode);
    }

    scanner.disconnect()?;
    println!("✓ Disconnected");

    Ok(())
}

fn io_error(e: std::io::Error) -> opnrust::Error {
    opnrust::Error::Transport(e.into())
}
