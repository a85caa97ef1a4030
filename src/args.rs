use std::net::SocketAddr;

use argh::FromArgs;

#[derive(FromArgs)]
/// hold the battery near a charge threshold by throttling charge current
pub struct GovernorArgs {
    /// address to serve the control page on
    #[argh(option, default = "crate::DEFAULT_LISTEN")]
    pub listen: SocketAddr,

    /// start governing right away at this battery percentage (39-100)
    #[argh(option, short = 'p')]
    pub percentage: Option<u8>,

    /// print a status line whenever the battery telemetry changes
    #[argh(switch)]
    pub dashboard: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<GovernorArgs, argh::EarlyExit> {
        GovernorArgs::from_args(&["charge_governor"], args)
    }

    #[test]
    fn defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.listen, "127.0.0.1:64001".parse().unwrap());
        assert_eq!(args.percentage, None);
        assert!(!args.dashboard);
    }

    #[test]
    fn all_options() {
        let args = parse(&["-p", "80", "--listen", "0.0.0.0:8080", "--dashboard"]).unwrap();
        assert_eq!(args.percentage, Some(80));
        assert_eq!(args.listen.port(), 8080);
        assert!(args.dashboard);
    }

    #[test]
    fn rejects_bad_address() {
        assert!(parse(&["--listen", "localhost"]).is_err());
    }
}
