use cmdtree::{HandlerError, HandlerResult, Invocation, Opt, Registry};

/// Stand-in for a real file operation: reports what it would have done.
fn dry_run(inv: &Invocation<'_>) -> HandlerResult {
    let [source, dest, ..] = inv.args else {
        return Err(HandlerError::failed(format!(
            "{} must be invoked with 2 parameters",
            inv.command_line()
        )));
    };
    let mode = if inv.options.flag("force") {
        "overwriting"
    } else {
        "keeping"
    };
    println!(
        "{} {source} -> {dest} ({mode} existing {dest}), options {}",
        inv.command_line(),
        inv.options
    );
    Ok(())
}

pub fn declare(registry: &mut Registry) {
    registry.command("file", |cmd| {
        cmd.desc("Operations on files")
            .text("Please invoke one of the sub-commands to perform a file operation.");
    });
    registry.command("dir", |cmd| {
        cmd.desc("Operations on directories")
            .text("Please invoke one of the sub-commands to perform a directory operation.");
    });

    let leaves = [
        ("file move", "Move a file", "Move a file from <source> to <dest>"),
        ("file copy", "Copy a file", "Copy a file from <source> to <dest>"),
        ("dir move", "Move directory from A to B", "Move a directory from <source> to <dest>"),
        ("dir copy", "Copy directory from A to B", "Copy a directory from <source> to <dest>"),
    ];
    for (path, desc, text) in leaves {
        registry.command(path, |cmd| {
            cmd.desc(desc)
                .text(text)
                .text("The destination will not be overwritten unless --force is applied.")
                .opt("force", "Force overwrite", Opt::new().default(false))
                .params("<source> <dest>")
                .exec(dry_run);
        });
    }
}
