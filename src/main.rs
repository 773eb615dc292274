use std::process::exit;

use tracing::{error, Level};

use clusterup::{init_runtime, init_settings, init_tracing, run};


fn main() {
    init_tracing(Level::INFO);

    let conf = match init_settings() {
        Ok(conf) => conf,
        Err(e) => {
            error!(error = %e, "could not load config");
            exit(1);
        }
    };

    let tokio = match init_runtime() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "could not start tokio runtime");
            exit(1);
        }
    };

    match run(conf, &tokio) {
        Ok(outcome) => {
            println!("{}", outcome);
            exit(outcome.exit_code());
        },
        Err(e) => {
            println!("cluster bootstrap failed: {}", e);
            exit(1);
        }
    }
}
