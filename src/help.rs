//! Help screen assembly.
//!
//! The assembler does not render anything itself. It produces the ordered
//! directive sequence the option parser is built from, and the parser renders
//! help from that same sequence.

use crate::commands::inherit::Resolution;
use crate::config::{ConfigKey, HelpConfig};
use crate::parser::{Directive, HELP_OPTION, Opt, OptSpec};

fn subcommand_listing(resolution: &Resolution<'_>, config: &HelpConfig) -> String {
    let prefix = resolution.command_line();
    let width = resolution
        .subcommands()
        .map(|name| name.chars().count() + prefix.chars().count() + 1)
        .max()
        .unwrap_or(0);

    let heading = if resolution.command.is_empty() {
        config.text(ConfigKey::TextHeaderTopcommands)
    } else {
        config.text(ConfigKey::TextHeaderSubcommands)
    };

    let mut listing = format!("\n{heading}\n");
    for name in resolution.subcommands() {
        let entry = format!("{prefix} {name}");
        let mut line = format!("  {entry:<width$}");
        if let Some(desc) = resolution.node.child(name).and_then(|child| child.description()) {
            line.push_str("   ");
            line.push_str(desc);
        }
        listing.push_str(line.trim_end());
        listing.push('\n');
    }
    listing
}

/// Assemble the parser directives for a resolved command: usage line, text
/// blocks, options sorted by name followed by the remaining declarations, the
/// help option and the subcommand listing.
#[must_use]
pub fn assemble(resolution: &Resolution<'_>, config: &HelpConfig) -> Vec<Directive> {
    let mut directives = vec![
        Directive::Nowrap(resolution.header.clone()),
        Directive::Banner(" ".to_string()),
    ];
    for text in &resolution.texts {
        directives.push(Directive::Banner((*text).to_string()));
        directives.push(Directive::Banner(" ".to_string()));
    }

    directives.push(Directive::Banner(
        config.text(ConfigKey::TextHeaderOptions).to_string(),
    ));
    let (mut options, rest): (Vec<&Directive>, Vec<&Directive>) =
        resolution.calls.iter().copied().partition(|call| call.is_opt());
    options.sort_by(|a, b| a.opt_name().cmp(&b.opt_name()));
    directives.extend(options.into_iter().chain(rest).cloned());

    if let Some(label) = config.get(ConfigKey::TextHelp) {
        directives.push(Directive::Opt(OptSpec {
            name: HELP_OPTION.to_string(),
            desc: label.to_string(),
            attrs: Opt::new(),
        }));
    }

    if resolution.has_subcommands() {
        directives.push(Directive::Banner(subcommand_listing(resolution, config)));
    }
    directives.push(Directive::Banner(" \n".to_string()));
    directives
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::registry::Registry;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    fn banners(directives: &[Directive]) -> Vec<&str> {
        directives
            .iter()
            .filter_map(|d| match d {
                Directive::Banner(text) | Directive::Nowrap(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_options_sorted_before_banners() {
        let mut registry = Registry::new();
        registry.set_program_name("tool");
        registry.command("", |cmd| {
            cmd.flag("b", "").banner("first banner").flag("a", "");
        });
        registry.command("sub", |cmd| {
            cmd.banner("second banner").flag("aa", "");
        });
        let res = registry.resolve(&argv(&["sub"]), "default").unwrap();
        let directives = assemble(&res, registry.config());

        let order: Vec<String> = directives
            .iter()
            .skip_while(|d| !matches!(d, Directive::Banner(t) if t == "Options:"))
            .map(|d| match d {
                Directive::Opt(spec) => spec.name.clone(),
                Directive::Banner(text) | Directive::Nowrap(text) => text.clone(),
                other => format!("{other:?}"),
            })
            .collect();
        assert_eq!(
            order,
            ["Options:", "a", "aa", "b", "first banner", "second banner", "help", " \n"]
        );
    }

    #[test]
    fn test_texts_are_separated() {
        let mut registry = Registry::new();
        registry.set_program_name("tool");
        registry.command("", |cmd| {
            cmd.text("Root");
        });
        registry.command("a", |cmd| {
            cmd.text("Leaf").text("More");
        });
        let res = registry.resolve(&argv(&["a"]), "default").unwrap();
        let directives = assemble(&res, registry.config());
        assert_eq!(
            banners(&directives)[..6],
            ["Usage: tool a", " ", "Root", " ", "Leaf\nMore", " "]
        );
    }

    #[test]
    fn test_help_option_can_be_disabled() {
        let mut registry = Registry::new();
        registry.configure("text_help", None).unwrap();
        registry.command("", |_| {});
        let res = registry.resolve(&[], "default").unwrap();
        let directives = assemble(&res, registry.config());
        assert!(!directives.iter().any(Directive::is_opt));
    }

    #[test]
    fn test_subcommand_listing() {
        let mut registry = Registry::new();
        registry.command("file move", |cmd| {
            cmd.desc("Move a file");
        });
        registry.command("file copy", |_| {});
        registry.command("dir", |cmd| {
            cmd.desc("Operations on directories");
        });

        let res = registry.resolve(&[], "default").unwrap();
        let listing = subcommand_listing(&res, registry.config());
        assert_eq!(listing, "\nCommands:\n   file\n   dir    Operations on directories\n");

        let res = registry.resolve(&argv(&["file"]), "default").unwrap();
        let listing = subcommand_listing(&res, registry.config());
        assert_eq!(
            listing,
            "\nSubcommands:\n  file move   Move a file\n  file copy\n"
        );
    }
}
