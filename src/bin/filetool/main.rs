mod calc;
mod file;

use std::fs::File;
use std::path::Path;
use std::process::ExitCode;

use cmdtree::{DEFAULT_SCOPE, Opt, Registry, logger};
use log::debug;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let log_file = std::env::var_os("CMDTREE_LOG_FILE")
        .map(File::create)
        .transpose()?;
    logger::init(log_file)?;

    let mut registry = Registry::new();
    match std::env::var_os("FILETOOL_CONFIG") {
        Some(path) => registry.configure_from_file(Path::new(&path))?,
        None => registry.configure("text_header_usage", Some("Syntax: %0 %command %params"))?,
    };

    declare_root(&mut registry);
    file::declare(&mut registry);
    calc::declare(&mut registry);

    Ok(registry.run(DEFAULT_SCOPE))
}

/// Global options, inherited by every command.
fn declare_root(registry: &mut Registry) {
    registry.command("", |cmd| {
        cmd.text("This is FileTool, a little example application.")
            .text("It's safe to play around with. All operations are no-ops.")
            .text("")
            .text("Invoke me with one of the sub-commands to perform a dummy operation.")
            .opt("debug", "Enable debugging", Opt::new().default(false))
            .flag("version", "Print version and exit")
            .trigger(&["version"], |_| {
                println!("Version {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            })
            .filter(|inv| {
                if inv.options.flag("debug") {
                    log::set_max_level(log::LevelFilter::Debug);
                    debug!(
                        "'{}' called with {}, {:?}",
                        inv.command_line(),
                        inv.options,
                        inv.args
                    );
                }
                Ok(())
            });
    });

    registry.command("print", |cmd| {
        cmd.desc("Print a string")
            .text("Print a string to the screen")
            .params("<string>")
            .opt("count", "Print how many times?", Opt::new().default(1))
            .exec(|inv| {
                if inv.args.is_empty() {
                    return Err(cmdtree::HandlerError::HelpRequested);
                }
                for _ in 0..inv.options.int("count").unwrap_or(1) {
                    println!("{}", inv.args.join(" "));
                }
                Ok(())
            });
    });
}
