//! Register-access scripts.
//!
//! One access per line, `#` starts a comment:
//!
//! ```text
//! w 0x70 1          # IE = TXWM
//! w TXDATA 0x5a     # register names work too
//! r RXDATA 0x5a     # optional expected value
//! reset
//! dump
//! ```

use anyhow::{anyhow, bail, Context, Result};
use spi_core::regs::REGISTER_NAMES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Write { offset: u64, value: u32 },
    Read { offset: u64, expect: Option<u32> },
    Reset,
    Dump,
}

/// A parsed op and the script line it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub line: usize,
    pub op: Op,
}

pub fn parse(text: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = i + 1;
        let code = raw.split('#').next().unwrap_or("").trim();
        if code.is_empty() { continue; }
        let op = parse_op(code).with_context(|| format!("line {}: `{}`", line, code))?;
        steps.push(Step { line, op });
    }
    Ok(steps)
}

fn parse_op(code: &str) -> Result<Op> {
    let words: Vec<&str> = code.split_whitespace().collect();
    match words.as_slice() {
        [w, off, val] if is_cmd(w, "w", "write") => Ok(Op::Write {
            offset: parse_offset(off)?,
            value: parse_value(val)?,
        }),
        [r, off] if is_cmd(r, "r", "read") => Ok(Op::Read { offset: parse_offset(off)?, expect: None }),
        [r, off, exp] if is_cmd(r, "r", "read") => Ok(Op::Read {
            offset: parse_offset(off)?,
            expect: Some(parse_value(exp)?),
        }),
        ["reset"] => Ok(Op::Reset),
        ["dump"] => Ok(Op::Dump),
        _ => bail!("unrecognized access"),
    }
}

fn is_cmd(word: &str, short: &str, long: &str) -> bool {
    word.eq_ignore_ascii_case(short) || word.eq_ignore_ascii_case(long)
}

/// Register name or numeric byte offset.
pub fn parse_offset(s: &str) -> Result<u64> {
    if let Some((off, _)) = REGISTER_NAMES.iter().find(|(_, n)| n.eq_ignore_ascii_case(s)) {
        return Ok(*off);
    }
    parse_number(s)
}

fn parse_value(s: &str) -> Result<u32> {
    let v = parse_number(s)?;
    u32::try_from(v).map_err(|_| anyhow!("value {} does not fit in 32 bits", s))
}

fn parse_number(s: &str) -> Result<u64> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|_| anyhow!("bad number `{}`", s))
}
