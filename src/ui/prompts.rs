use anyhow::{Context, Result};
use log::debug;
use std::io::{BufRead, Write};

/// Interpret one line of input as a yes/no answer
///
/// Only the whole tokens `y`, `yes`, `n` and `no` are recognised, in any case
/// and with surrounding whitespace ignored.
///
/// # Returns
/// * `Some(true)` for yes, `Some(false)` for no
/// * `None` for anything else
pub fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Blocking yes/no confirmation read line by line
///
/// Writes `prompt` followed by `[yes/no]` and keeps asking until a
/// recognised answer arrives. End of input is an error since no answer can
/// ever arrive.
///
/// # Arguments
/// * `input` - Where answers are read from
/// * `output` - Where the prompt is written
/// * `prompt` - The question to ask the user
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<bool> {
    loop {
        write!(output, "{} [yes/no] ", prompt)?;
        output.flush()?;

        // Raw bytes: a line that isn't UTF-8 is just another bad answer
        let mut buf = Vec::new();
        let read = input
            .read_until(b'\n', &mut buf)
            .context("Failed to read confirmation answer")?;
        if read == 0 {
            anyhow::bail!("Input closed while waiting for a yes/no answer");
        }

        let line = String::from_utf8_lossy(&buf);
        match parse_answer(&line) {
            Some(answer) => return Ok(answer),
            None => debug!("Unrecognised answer {:?}, asking again", line.trim()),
        }
    }
}
