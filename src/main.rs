use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use fatbrowse::fs;
use fatbrowse::shell::Shell;

/// Browse a FAT12 disk image with `ls` and `cat`.
#[derive(Parser)]
#[command(name = "fatbrowse", version, about)]
struct Cli {
    /// Path to the disk image.
    #[arg(default_value = "a.img")]
    image: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let volume = fs::open_image(&cli.image)
        .with_context(|| format!("failed to load {}", cli.image.display()))?;

    println!("Init finished.");
    println!("Hello, FAT-12.");

    let shell = Shell::new(volume);
    let stdin = io::stdin();
    shell.run(&mut stdin.lock(), &mut io::stdout(), &mut io::stderr())?;
    Ok(())
}
