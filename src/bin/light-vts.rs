use clap::Parser;
use tracing::info;

use lightvts::args::{self, VtsArgs};
use lightvts::harness::{self, Filter};
use lightvts::client::RemoteLight;

fn main() -> anyhow::Result<()> {
    lightvts::init_tracing();
    let args = match VtsArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let status = args::usage_exit_code(&e);
            let _ = e.print();
            std::process::exit(status);
        }
    };
    let filter = Filter::parse(&args.filter);

    if args.list_tests {
        println!("{}.", harness::SUITE_NAME);
        for case in harness::test_cases::<RemoteLight>() {
            if filter.matches(&case.full_name()) {
                println!("  {}", case.name);
            }
        }
        return Ok(());
    }

    info!(
        "testing service '{}' in {}",
        args.service_name,
        args.socket_dir.display()
    );
    let report = harness::run_suite(&args.locator(), &args.service_name, &filter);
    let status = report.exit_code();
    info!("Test result = {}", status);
    std::process::exit(status);
}
