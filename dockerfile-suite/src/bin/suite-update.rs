use anyhow::Result;
use std::{
    env,
    io::{stderr, stdout},
    process,
};
use structopt::StructOpt;

use dockerfile_suite::{
    cli::{self, UpdateOpt},
    output,
};

fn run() -> Result<()> {
    let opt = UpdateOpt::from_args();

    let current_dir = env::current_dir()?;
    let (image_dir, suites) = cli::select_image_dir(&opt.image, &current_dir)?;

    let mut stdout = stdout();
    cli::update(&image_dir, &suites, &mut stdout)?;

    Ok(())
}

fn main() {
    pretty_env_logger::init_custom_env("LOG");

    if let Err(err) = run() {
        let _ = output::print_error(&mut stderr(), &err);
        process::exit(1);
    }
}
