use dsm_ppmi::Pipeline;
use std::process;
use env_logger::Env;

fn main() {

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = Pipeline::run_from_args() {
        log::error!("{}", e);
        process::exit(1);
    }
}
