use anyhow::Result;
use log::info;
use std::{
    env,
    io::{stderr, stdout},
    process,
};
use structopt::StructOpt;

use dockerfile_suite::{
    backends::DockerBackend,
    cli::{self, PublishOpt},
    output,
};

fn run() -> Result<usize> {
    let opt = PublishOpt::from_args();

    let current_dir = env::current_dir()?;
    let (image_dir, suites) = cli::select_image_dir(&opt.image, &current_dir)?;

    let backend = DockerBackend::new(&image_dir, opt.dry_run);
    let mut stdout = stdout();
    let failures = cli::publish(&image_dir, &suites, opt.options(), backend, &mut stdout)?;
    info!("publishing finished with {} failed commands", failures);

    Ok(failures)
}

fn main() {
    pretty_env_logger::init_custom_env("LOG");

    match run() {
        Ok(0) => (),
        Ok(failures) => {
            let err = anyhow::anyhow!("{} docker command(s) failed", failures);
            let _ = output::print_error(&mut stderr(), &err);
            process::exit(1);
        }
        Err(err) => {
            let _ = output::print_error(&mut stderr(), &err);
            process::exit(1);
        }
    }
}
