mod opt;

use crate::opt::Opt;

use std::{
    env::var_os,
    io::{stdout, Write},
    path::Path,
};

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::{generate, shells::*, Generator};
use strum::{Display, EnumString};

#[derive(
    Copy,
    Clone,
    Debug,
    Display,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    EnumString,
    ValueEnum,
)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "lowercase")]
enum Shell {
    Bash,
    Elvish,
    Fish,
    #[allow(clippy::enum_variant_names)]
    PowerShell,
    Zsh,
}

#[derive(Debug, Parser)]
struct ShellSelect {
    /// Shell for which to generate completions
    ///
    /// If omitted, generate completions for the shell in `$SHELL`
    #[clap(value_enum)]
    shell: Option<Shell>,
}

fn gen_completion<S: Copy + Generator, W: Write>(shell: S, mut to: W) {
    generate(shell, &mut Opt::command(), "dijets", &mut to);
}

fn main() -> Result<()> {
    let shell = ShellSelect::parse()
        .shell
        .map_or_else(get_login_shell, Ok)
        .context("Failed to determine shell")?;
    eprintln!("Generating {shell} completions");
    let out = stdout().lock();
    match shell {
        Shell::Bash => gen_completion(Bash, out),
        Shell::Elvish => gen_completion(Elvish, out),
        Shell::Fish => gen_completion(Fish, out),
        Shell::PowerShell => gen_completion(PowerShell, out),
        Shell::Zsh => gen_completion(Zsh, out),
    }
    Ok(())
}

fn get_login_shell() -> Result<Shell> {
    let shell = var_os("SHELL").ok_or_else(|| anyhow!("$SHELL is not set"))?;
    let Some(shell_name) = Path::new(&shell)
        .file_name()
        .and_then(|name| name.to_str())
    else {
        return Err(anyhow!("Failed to extract shell name from {shell:?}"));
    };
    let shell = shell_name
        .parse()
        .with_context(|| format!("{shell_name} is not a supported shell"))?;
    Ok(shell)
}
