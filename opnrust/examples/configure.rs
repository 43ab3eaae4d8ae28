//! Write a scanner parameter and read it back
//!
//! ```text
//! OPN_PORT=/dev/ttyUSB0 cargo run --example configure -- VOLUME 0
//! ```

use opnrust::{Parameter, Scanner, SerialConfig};

fn main() -> opnrust::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(name), Some(value)) = (args.next(), args.next()) else {
        eprintln!("usage: configure <PARAMETER> <VALUE>");
        std::process::exit(2);
    };

    let param: Parameter = name.parse()?;
    let value: u8 = value
        .parse()
        .map_err(|e| opnrust_types::Error::Parse(format!("value {value:?}: {e}")))?;

    let mut scanner = Scanner::serial(SerialConfig::from_env()?);
    scanner.connect()?;

    let before = scanner.get_param(param)?;
    println!("{} was {}", param, before);

    let stored = scanner.set_param(param, value)?;
    println!("{} set to {}", param, stored);

    scanner.disconnect()?;

    Ok(())
}
