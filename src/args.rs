use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;

use crate::client::SocketLocator;
use crate::light_api::LightType;
use crate::service::LIGHT_SERVICE_NAME;

/// Runs the light service conformance suite.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct VtsArgs {
    /// Name the light service is registered under.
    #[clap(short = 'n', long, default_value = LIGHT_SERVICE_NAME)]
    pub service_name: String,

    /// Directory holding the service sockets.
    #[clap(short, long, env = "LIGHT_SERVICE_DIR", default_value = "/run/lights")]
    pub socket_dir: PathBuf,

    /// Give up on a call after this many milliseconds. Waits forever if unset.
    #[clap(short, long)]
    pub timeout_ms: Option<u64>,

    /// Only run tests matching this gtest style filter.
    #[clap(short, long, default_value = "*")]
    pub filter: String,

    /// List the test names and exit.
    #[clap(long)]
    pub list_tests: bool,
}

impl VtsArgs {
    pub fn locator(&self) -> SocketLocator {
        return SocketLocator::new(self.socket_dir.clone()).with_timeout(self.timeout_ms.map(Duration::from_millis));
    }
}

/// Exit status for a command line clap refused: 0 when it only printed help
/// or version, 1 for a real usage error so it counts as a failed run.
pub fn usage_exit_code(err: &clap::Error) -> i32 {
    return match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    };
}

/// Serves a light device without hardware, for trying out clients.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct DummyArgs {
    /// Directory to create the service socket in.
    #[clap(short, long, env = "LIGHT_SERVICE_DIR", default_value = "/run/lights")]
    pub socket_dir: PathBuf,

    /// Name to register the service under.
    #[clap(short, long, default_value = LIGHT_SERVICE_NAME)]
    pub name: String,

    /// The light types the device supports. All of them if omitted.
    #[clap(long, use_value_delimiter = true, value_delimiter = ',')]
    pub supported: Vec<LightType>,

    /// Answer low persistence requests with BRIGHTNESS_NOT_SUPPORTED.
    #[clap(long)]
    pub no_low_persistence: bool,
}

/// A shell for poking at a light service by hand.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct ShellArgs {
    /// Name the light service is registered under.
    #[clap(short = 'n', long, default_value = LIGHT_SERVICE_NAME)]
    pub service_name: String,

    /// Directory holding the service sockets.
    #[clap(short, long, env = "LIGHT_SERVICE_DIR", default_value = "/run/lights")]
    pub socket_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_supported_list_is_comma_separated() {
        let args = DummyArgs::parse_from(["lightd-dummy", "--supported", "backlight,WIFI", "--no-low-persistence"]);
        assert_eq!(args.supported, vec![LightType::Backlight, LightType::Wifi]);
        assert!(args.no_low_persistence);
        assert_eq!(args.name, "light");
    }

    #[test]
    fn vts_defaults() {
        let args = VtsArgs::parse_from(["light-vts", "--socket-dir", "/tmp/lights"]);
        assert_eq!(args.service_name, "light");
        assert_eq!(args.filter, "*");
        let locator = args.locator();
        assert_eq!(locator.socket_path("light"), PathBuf::from("/tmp/lights/light.sock"));
        assert_eq!(locator.timeout, None);
    }

    #[test]
    fn bad_arguments_exit_with_failure() {
        let err = VtsArgs::try_parse_from(["light-vts", "--bogus"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), 1);
        let err = VtsArgs::try_parse_from(["light-vts", "--timeout-ms", "abc"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), 1);
        let err = VtsArgs::try_parse_from(["light-vts", "--help"]).unwrap_err();
        assert_eq!(usage_exit_code(&err), 0);
    }
}
