use clap::Parser;
use tracing::info;

use lightvts::args::DummyArgs;
use lightvts::client::SocketLocator;
use lightvts::daemon;
use lightvts::dummy::DummyLight;
use lightvts::ALL_TYPES;

/// A version of a light daemon without hardware that only logs the states it
/// would apply.
fn main() -> anyhow::Result<()> {
    lightvts::init_tracing();
    let args = DummyArgs::parse();
    let supported = if args.supported.is_empty() {
        ALL_TYPES.to_vec()
    } else {
        args.supported.clone()
    };
    info!(
        "serving {:?}, low persistence {}",
        supported,
        if args.no_low_persistence { "off" } else { "on" }
    );
    let light = DummyLight::new(supported, !args.no_low_persistence);
    std::fs::create_dir_all(&args.socket_dir)?;
    let socket = SocketLocator::new(args.socket_dir.clone()).socket_path(&args.name);
    let listener = daemon::listen(&socket)?;
    daemon::run(listener, light);
    return Ok(());
}
