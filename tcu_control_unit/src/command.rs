//! Operator command handling.
//!
//! Bench commands arrive over a channel and are drained once per tick
//! by the cycle runner; this module owns the console-line decoding and
//! validation. Commands bypass the shift state machine entirely.

use tcu::error::CommandError;
use tcu::interfaces::TcuCommand;
use tcu::state::Gear;

/// Decode one console line into a command.
///
/// Grammar:
/// - `gear <1..4>` — force a gear
/// - `reset` — zero adaptive trims and counters
/// - `limp on` / `limp off` — latch or clear limp mode
pub fn parse_console_line(line: &str) -> Result<TcuCommand, CommandError> {
    let mut words = line.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("gear"), Some(n), None) => {
            let raw: u8 = n
                .parse()
                .map_err(|_| CommandError::Unrecognized(line.to_string()))?;
            let gear = Gear::from_u8(raw).ok_or(CommandError::InvalidGear(raw))?;
            Ok(TcuCommand::ForceGear(gear))
        }
        (Some("reset"), None, None) => Ok(TcuCommand::ResetAdaptive),
        (Some("limp"), Some("on"), None) => Ok(TcuCommand::SetLimp(true)),
        (Some("limp"), Some("off"), None) => Ok(TcuCommand::SetLimp(false)),
        _ => Err(CommandError::Unrecognized(line.to_string())),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
