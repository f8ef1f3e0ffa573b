//! Interactive command loop over a decoded volume.
//!
//! Commands are routed through a dispatch table built once at startup and
//! immutable afterward. A failed command reports its error and the loop
//! continues; only end-of-input ends the session.

use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead, Write};

use crate::error::FatBrowseError;
use crate::fs::volume::{Fat12Volume, ListingBlock};

const FORMAT_RED: &str = "\x1b[31m";
const FORMAT_NIL: &str = "\x1b[0m";

/// Single-letter flags the tokenizer accepts.
const OPTIONS: &[char] = &['l'];

type CommandFn =
    fn(&Shell, &[String], &HashSet<char>, &mut dyn Write) -> Result<(), FatBrowseError>;

/// The `ls` / `cat` REPL.
pub struct Shell {
    volume: Fat12Volume,
    commands: HashMap<&'static str, CommandFn>,
}

impl Shell {
    pub fn new(volume: Fat12Volume) -> Self {
        let mut commands: HashMap<&'static str, CommandFn> = HashMap::new();
        commands.insert("ls", Self::cmd_ls);
        commands.insert("cat", Self::cmd_cat);
        Self { volume, commands }
    }

    /// Run the command loop until end of input.
    ///
    /// Command errors go to `err` and the loop keeps going; only I/O
    /// failures on the streams themselves abort.
    pub fn run<I, O, E>(&self, input: &mut I, out: &mut O, err: &mut E) -> io::Result<()>
    where
        I: BufRead,
        O: Write,
        E: Write,
    {
        loop {
            writeln!(out, "----------------------------------------")?;
            write!(out, "> ")?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out, "bye~\n")?;
                return Ok(());
            }
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }
            if let Err(e) = self.dispatch(&words, out) {
                match e {
                    FatBrowseError::Io(e) => return Err(e),
                    other => writeln!(err, "{other}")?,
                }
            }
        }
    }

    /// Tokenize one input line into command, positional arguments and
    /// flags, then invoke the matching handler.
    fn dispatch(&self, words: &[&str], out: &mut dyn Write) -> Result<(), FatBrowseError> {
        let command = words[0];
        let handler = *self
            .commands
            .get(command)
            .ok_or_else(|| FatBrowseError::InvalidCommand(command.to_string()))?;

        let mut args = Vec::new();
        let mut flags = HashSet::new();
        for word in &words[1..] {
            if let Some(group) = word.strip_prefix('-') {
                for c in group.chars() {
                    if !OPTIONS.contains(&c) {
                        return Err(FatBrowseError::UnexpectedOption(c));
                    }
                    flags.insert(c);
                }
            } else {
                args.push(word.to_string());
            }
        }
        handler(self, &args, &flags, out)
    }

    // ls [-l] [path=/]
    fn cmd_ls(
        &self,
        args: &[String],
        flags: &HashSet<char>,
        out: &mut dyn Write,
    ) -> Result<(), FatBrowseError> {
        let mut path = args.first().cloned().unwrap_or_else(|| "/".to_string());
        if !path.ends_with('/') {
            path.push('/');
        }
        let dir = self.volume.resolve_directory(&path)?;
        let long_format = flags.contains(&'l');
        for block in self.volume.listing(dir, &path, long_format) {
            render_block(&block, long_format, out)?;
        }
        Ok(())
    }

    // cat <path>
    fn cmd_cat(
        &self,
        args: &[String],
        flags: &HashSet<char>,
        out: &mut dyn Write,
    ) -> Result<(), FatBrowseError> {
        let path = args
            .first()
            .ok_or_else(|| FatBrowseError::MissingArgument("<path>".to_string()))?;
        if let Some(&flag) = flags.iter().next() {
            return Err(FatBrowseError::UnexpectedOption(flag));
        }
        let file = self.volume.resolve_file(path)?;
        let text = String::from_utf8_lossy(self.volume.contents(file));
        writeln!(out, "{text}")?;
        Ok(())
    }
}

/// Render one listing block in the interactive format: a `path[ detail]:`
/// header, children separated by two spaces (directories and aliases in
/// red), one per line with detail in long format.
fn render_block(block: &ListingBlock, long_format: bool, out: &mut dyn Write) -> io::Result<()> {
    write!(out, "{}", block.path)?;
    if let Some(detail) = &block.detail {
        write!(out, " {detail}")?;
    }
    writeln!(out, ":")?;

    for entry in &block.entries {
        if entry.is_alias || entry.is_directory {
            write!(out, "{FORMAT_RED}{}{FORMAT_NIL}", entry.name)?;
        } else {
            write!(out, "{}", entry.name)?;
        }
        write!(out, "  ")?;
        if long_format {
            match &entry.detail {
                Some(detail) => writeln!(out, "{detail}")?,
                None => writeln!(out)?,
            }
        }
    }
    writeln!(out)?;
    Ok(())
}
