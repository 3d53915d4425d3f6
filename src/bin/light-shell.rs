use std::io::Write;

use clap::Parser;

use lightvts::args::ShellArgs;
use lightvts::client::SocketLocator;
use lightvts::{Brightness, Flash, LightService, LightState, LightType, ServiceLocator, OFF};

macro_rules! skip_fail {
    ($res:expr) => {
        match $res {
            Ok(val) => val,
            Err(e) => {
                println!("Invalid value: {}", e);
                continue;
            }
        }
    };
}

fn parse_color(value: &str) -> anyhow::Result<u32> {
    let digits = value.trim_start_matches("0x").trim_start_matches("0X");
    return Ok(u32::from_str_radix(digits, 16)?);
}

/// `COLOR [FLASH ON_MS OFF_MS] [BRIGHTNESS]`
fn parse_state(words: &[&str]) -> anyhow::Result<LightState> {
    let mut state = OFF;
    let mut rest = words;
    match rest.first() {
        Some(color) => state.color = parse_color(color)?,
        None => anyhow::bail!("missing color"),
    }
    rest = &rest[1..];
    if rest.len() >= 3 {
        state.flash_mode = rest[0].parse::<Flash>()?;
        state.flash_on_ms = rest[1].parse()?;
        state.flash_off_ms = rest[2].parse()?;
        rest = &rest[3..];
    }
    if let Some(mode) = rest.first() {
        state.brightness_mode = mode.parse::<Brightness>()?;
    }
    return Ok(state);
}

/// A shell for interactive debugging.
fn main() -> anyhow::Result<()> {
    lightvts::init_tracing();
    let args = ShellArgs::parse();
    let locator = SocketLocator::new(args.socket_dir.clone());
    let mut light = locator.get_service(&args.service_name)?;
    let mut input = String::new();
    loop {
        print!("light> ");
        std::io::stdout().flush()?;
        input.clear();
        if std::io::stdin().read_line(&mut input)? == 0 {
            return Ok(());
        }
        let words: Vec<&str> = input.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["help"] => println!(
                "Valid commands are: types, set TYPE COLOR [FLASH ON_MS OFF_MS] [BRIGHTNESS], off TYPE, quit"
            ),
            ["quit"] | ["exit"] => return Ok(()),
            ["types"] => {
                for light_type in light.get_supported_types()? {
                    println!("{}", light_type);
                }
            }
            ["off", light_type] => {
                let light_type = skip_fail!(light_type.parse::<LightType>());
                println!("{}", light.set_light(light_type, &OFF)?);
            }
            ["set", light_type, state @ ..] => {
                let light_type = skip_fail!(light_type.parse::<LightType>());
                let state = skip_fail!(parse_state(state));
                println!("{}", light.set_light(light_type, &state)?);
            }
            _ => println!("unknown command '{}', try 'help'", input.trim()),
        }
    }
}
