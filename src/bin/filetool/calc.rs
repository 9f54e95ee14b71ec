use cmdtree::{DEFAULT_SCOPE, HandlerError, Invocation, Registry};

fn numbers(inv: &Invocation<'_>) -> Result<Vec<i64>, HandlerError> {
    if inv.args.len() < 2 {
        println!("Error: Need at least two parameters!");
        return Err(HandlerError::HelpRequested);
    }
    inv.args
        .iter()
        .map(|arg| arg.parse::<i64>().map_err(HandlerError::failed))
        .collect()
}

pub fn declare(registry: &mut Registry) {
    registry.label_path(DEFAULT_SCOPE, "calc", &["Calculator"]);

    registry.command("calc multi", |cmd| {
        cmd.desc("Multiply some numbers")
            .text("Multiplication is awesome!")
            .params("<int> <int> [int] ...")
            .exec(|inv| {
                println!("{}", numbers(inv)?.iter().product::<i64>());
                Ok(())
            });
    });

    registry.command("calc add", |cmd| {
        cmd.desc("Add some numbers")
            .text("Addition is awesome!")
            .flag("argh", "Just say 'ARGH!' and exit")
            .trigger(&["argh"], |_| {
                println!("ARGH!");
                Ok(())
            })
            .params("<int> <int> [int] ...")
            .exec(|inv| {
                println!("{}", numbers(inv)?.iter().sum::<i64>());
                Ok(())
            });
    });
}
