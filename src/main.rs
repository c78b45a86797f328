use std::env;

const USAGE: &str = "Usage: smartzpp serve [port] | smartzpp solve --parent-a-income <N> --parent-a-birth-year <Y> --parent-b-income <N> --parent-b-birth-year <Y> [options]";

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    let raw_args: Vec<String> = env::args().collect();
    match raw_args.get(1).map(|s| s.as_str()) {
        Some("serve") => {
            let port = raw_args
                .get(2)
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8080);
            if let Err(e) = smartzpp::api::run_http_server(port).await {
                eprintln!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Some("solve") => match smartzpp::api::run_cli(&raw_args[1..]) {
            Ok(report) => println!("{report}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }
}
