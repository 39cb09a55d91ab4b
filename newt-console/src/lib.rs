// Copyright (C) 2026 newt contributors
//
// MIT License

//! newt-console library
//!
//! The textual command surface of the newt probe.  Maps line-oriented
//! commands (as read from the serial console by the firmware) onto
//! [`DebugInterface`] operations, and formats results and diagnostics.
//!
//! The console is generic over [`core::fmt::Write`] for its output, so it
//! runs unchanged against a UART or a test string.  Reading lines - echo,
//! backspace handling, prompts - is the platform's job.

#![no_std]

pub mod images;

extern crate alloc;
use alloc::vec::Vec;
use core::fmt::{self, Write};
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use newt_core::arm::scs::CoreReg;
use newt_swd::{DebugInterface, SwdBus};

use crate::images::RAM_BASE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandKind {
    Help,
    Init,
    Status,
    Halt,
    Continue,
    Reset,
    Step,
    Pc,
    Load,
    Set,
    Read,
}

/// One row of the command table
struct Command {
    name: &'static str,
    /// Optional single-character alias
    alias: Option<char>,
    /// Usage suffix shown in help, empty for argument-less commands
    usage: &'static str,
    help: &'static str,
    /// Exact number of arguments required
    arity: usize,
    kind: CommandKind,
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        alias: Some('h'),
        usage: "",
        help: "Print this help",
        arity: 0,
        kind: CommandKind::Help,
    },
    Command {
        name: "init",
        alias: Some('i'),
        usage: "",
        help: "Initialize SWD debug (must be run first)",
        arity: 0,
        kind: CommandKind::Init,
    },
    Command {
        name: "status",
        alias: Some('d'),
        usage: "",
        help: "Show debug status",
        arity: 0,
        kind: CommandKind::Status,
    },
    Command {
        name: "halt",
        alias: None,
        usage: "",
        help: "Halt core",
        arity: 0,
        kind: CommandKind::Halt,
    },
    Command {
        name: "continue",
        alias: Some('c'),
        usage: "",
        help: "Continue core",
        arity: 0,
        kind: CommandKind::Continue,
    },
    Command {
        name: "reset",
        alias: None,
        usage: "",
        help: "Reset core and halt",
        arity: 0,
        kind: CommandKind::Reset,
    },
    Command {
        name: "step",
        alias: Some('s'),
        usage: "",
        help: "Single step",
        arity: 0,
        kind: CommandKind::Step,
    },
    Command {
        name: "pc",
        alias: None,
        usage: "",
        help: "Read current pc",
        arity: 0,
        kind: CommandKind::Pc,
    },
    Command {
        name: "load",
        alias: None,
        usage: "<program>",
        help: "Load precompiled program (blink, simple)",
        arity: 1,
        kind: CommandKind::Load,
    },
    Command {
        name: "set",
        alias: None,
        usage: "<address> <value>",
        help: "Set a memory address",
        arity: 2,
        kind: CommandKind::Set,
    },
    Command {
        name: "read",
        alias: None,
        usage: "<address | $reg>",
        help: "Read a memory address or core register",
        arity: 1,
        kind: CommandKind::Read,
    },
];

fn lookup(token: &str) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| {
        c.name == token
            || (token.len() == 1 && c.alias.is_some_and(|a| token.chars().next() == Some(a)))
    })
}

/// Parse a hex literal: `0x` followed by exactly 8 hex digits
pub fn parse_hex_u32(s: &str) -> Option<u32> {
    let digits = s.strip_prefix("0x")?;
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

fn error_line<W: Write>(out: &mut W, msg: fmt::Arguments<'_>) -> fmt::Result {
    writeln!(out, "\x1b[31merror:\x1b[0m {msg}")
}

/// The probe's REPL command dispatcher
///
/// Owns the [`DebugInterface`].  Feed it one line at a time via
/// [`Console::handle_line`]; no command failure is fatal, the caller just
/// reads the next line.
pub struct Console<B: SwdBus> {
    debug: DebugInterface<B>,
}

impl<B: SwdBus> Console<B> {
    pub fn new(debug: DebugInterface<B>) -> Self {
        Self { debug }
    }

    pub fn from_bus(bus: B) -> Self {
        Self::new(DebugInterface::from_bus(bus))
    }

    /// Access the underlying [`DebugInterface`]
    pub fn debug_mut(&mut self) -> &mut DebugInterface<B> {
        &mut self.debug
    }

    /// Tokenize and dispatch one input line.
    ///
    /// Commands match on their full name or single-character alias.  Errors
    /// are reported on `out`; only output failures propagate.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> fmt::Result {
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else {
            return Ok(());
        };
        let args: Vec<&str> = tokens.collect();

        let Some(command) = lookup(first) else {
            return error_line(
                out,
                format_args!("unknown command '{first}' - enter help or h for the command list"),
            );
        };

        if args.len() != command.arity {
            writeln!(out, "Incorrect number of arguments. Format should be:")?;
            return writeln!(out, "{} {}", command.name, command.usage);
        }

        match command.kind {
            CommandKind::Help => self.cmd_help(out),
            CommandKind::Init => self.cmd_init(out),
            CommandKind::Status => self.cmd_status(out),
            CommandKind::Halt => self.cmd_halt(out),
            CommandKind::Continue => self.cmd_continue(out),
            CommandKind::Reset => self.cmd_reset(out),
            CommandKind::Step => self.cmd_step(out),
            CommandKind::Pc => self.cmd_pc(out),
            CommandKind::Load => self.cmd_load(args[0], out),
            CommandKind::Set => self.cmd_set(args[0], args[1], out),
            CommandKind::Read => self.cmd_read(args[0], out),
        }
    }

    fn cmd_help<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        writeln!(out, "DEBUG HELP:")?;
        writeln!(out)?;
        for command in COMMANDS {
            if command.usage.is_empty() {
                writeln!(out, "    {} - {}", command.name, command.help)?;
            } else {
                writeln!(out, "    {} {} - {}", command.name, command.usage, command.help)?;
            }
        }
        Ok(())
    }

    fn cmd_init<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        match self.debug.initialize_target() {
            Ok(idcode) => writeln!(out, "Debug initialized (IDCODE: {idcode})"),
            Err(e) => error_line(out, format_args!("Debug unable to initialize: {e}")),
        }
    }

    fn cmd_status<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        match self.debug.status() {
            Ok(status) => writeln!(out, "{status}"),
            Err(e) => error_line(out, format_args!("Failed getting debug status: {e}")),
        }
    }

    fn cmd_halt<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        match self.debug.halt() {
            Ok(()) => writeln!(out, "Core successfully halted"),
            Err(e) => error_line(out, format_args!("Halt failed: {e}")),
        }
    }

    fn cmd_continue<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        match self.debug.run() {
            Ok(()) => Ok(()),
            Err(e) => error_line(out, format_args!("Continue failed: {e}")),
        }
    }

    fn cmd_reset<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        match self.debug.reset_halt() {
            Ok(()) => writeln!(out, "Successfully reset core"),
            Err(e) => error_line(out, format_args!("Reset failed: {e}")),
        }
    }

    fn cmd_step<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        match self.debug.step() {
            Ok(pc) => writeln!(out, "PC: 0x{pc:08x}"),
            Err(e) => error_line(out, format_args!("Failed single stepping: {e}")),
        }
    }

    fn cmd_pc<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        match self.debug.read_core_register(CoreReg::Pc) {
            Ok(pc) => writeln!(out, "PC: 0x{pc:08x}"),
            Err(e) => error_line(out, format_args!("Failed reading pc: {e}")),
        }
    }

    fn cmd_load<W: Write>(&mut self, name: &str, out: &mut W) -> fmt::Result {
        let image = images::by_name(name);
        writeln!(out, "Loading {} ({} bytes)", image.name, image.bytes.len())?;
        match self.debug.load_image(image.bytes, RAM_BASE) {
            Ok(()) => writeln!(out, "Verification success"),
            Err(e) => error_line(out, format_args!("Load failed: {e}")),
        }
    }

    fn cmd_set<W: Write>(&mut self, addr: &str, value: &str, out: &mut W) -> fmt::Result {
        let (Some(addr), Some(value)) = (parse_hex_u32(addr), parse_hex_u32(value)) else {
            writeln!(
                out,
                "Incorrect format. Address and value should be in hex format like 0x12341234"
            )?;
            return Ok(());
        };

        match self.debug.swd_if().mem_write(addr, value) {
            Ok(()) => writeln!(out, "Wrote 0x{value:08x} to address 0x{addr:08x}"),
            Err(e) => error_line(out, format_args!("Failed writing memory: {e}")),
        }
    }

    fn cmd_read<W: Write>(&mut self, target: &str, out: &mut W) -> fmt::Result {
        if let Some(reg_name) = target.strip_prefix('$') {
            let Some(reg) = CoreReg::parse(reg_name) else {
                return error_line(out, format_args!("unknown register '{reg_name}'"));
            };
            return match self.debug.read_core_register(reg) {
                Ok(value) => writeln!(out, "{reg_name}: 0x{value:08x}"),
                Err(e) => error_line(out, format_args!("Failed reading register: {e}")),
            };
        }

        let Some(addr) = parse_hex_u32(target) else {
            writeln!(
                out,
                "Incorrect format. Address should be in hex format like 0x12341234"
            )?;
            return Ok(());
        };

        match self.debug.swd_if().mem_read(addr) {
            Ok(value) => writeln!(out, "0x{addr:08x}: 0x{value:08x}"),
            Err(e) => error_line(out, format_args!("Failed reading memory: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use newt_swd::sim::SimTarget;

    fn console() -> Console<SimTarget> {
        Console::from_bus(SimTarget::new())
    }

    fn run(console: &mut Console<SimTarget>, line: &str) -> String {
        let mut out = String::new();
        console.handle_line(line, &mut out).unwrap();
        out
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(parse_hex_u32("0x12341234"), Some(0x12341234));
        assert_eq!(parse_hex_u32("0xdeadBEEF"), Some(0xDEADBEEF));
        assert_eq!(parse_hex_u32("12341234"), None);
        assert_eq!(parse_hex_u32("0x1234"), None);
        assert_eq!(parse_hex_u32("0x123412345"), None);
        assert_eq!(parse_hex_u32("0x1234123z"), None);
        assert_eq!(parse_hex_u32(""), None);
    }

    #[test]
    fn help_lists_every_command() {
        let mut console = console();
        let out = run(&mut console, "help");
        for command in COMMANDS {
            assert!(out.contains(command.name), "missing {}", command.name);
        }
        // Single-char alias works too
        assert_eq!(run(&mut console, "h"), out);
    }

    #[test]
    fn empty_and_unknown_lines() {
        let mut console = console();
        assert_eq!(run(&mut console, ""), "");
        assert_eq!(run(&mut console, "   "), "");
        assert!(run(&mut console, "bogus").contains("error:"));
    }

    #[test]
    fn wrong_arity_prints_usage() {
        let mut console = console();
        let out = run(&mut console, "set 0x12341234");
        assert!(out.contains("Incorrect number of arguments"));
        assert!(out.contains("set <address> <value>"));
    }

    #[test]
    fn commands_before_init_report_not_ready() {
        let mut console = console();
        let out = run(&mut console, "halt");
        assert!(out.contains("error:"));
        assert!(out.contains("Not Ready"));
    }

    #[test]
    fn init_reports_idcode() {
        let mut console = console();
        let out = run(&mut console, "init");
        assert!(out.contains("Debug initialized"));
        assert!(out.contains("0x2BA01477"));
        // And via the alias
        assert!(run(&mut console, "i").contains("Debug initialized"));
    }

    #[test]
    fn set_and_read_round_trip() {
        let mut console = console();
        run(&mut console, "init");

        let out = run(&mut console, "set 0x20000000 0xdeadbeef");
        assert_eq!(out, "Wrote 0xdeadbeef to address 0x20000000\n");

        let out = run(&mut console, "read 0x20000000");
        assert_eq!(out, "0x20000000: 0xdeadbeef\n");
    }

    #[test]
    fn set_rejects_malformed_hex() {
        let mut console = console();
        run(&mut console, "init");
        let out = run(&mut console, "set 20000000 0xdeadbeef");
        assert!(out.contains("Incorrect format"));
    }

    #[test]
    fn halt_status_continue_flow() {
        let mut console = console();
        run(&mut console, "init");

        assert!(run(&mut console, "status").contains("Core currently running"));
        assert!(run(&mut console, "halt").contains("Core successfully halted"));
        assert!(run(&mut console, "d").contains("In Debug Mode"));
        assert_eq!(run(&mut console, "c"), "");
        assert!(run(&mut console, "status").contains("Core currently running"));
    }

    #[test]
    fn register_read_by_name() {
        let mut console = console();
        run(&mut console, "init");
        run(&mut console, "halt");

        console
            .debug_mut()
            .swd_if()
            .bus_mut()
            .set_core_reg(0x0F, 0x2000_0040);

        assert_eq!(run(&mut console, "pc"), "PC: 0x20000040\n");
        assert_eq!(run(&mut console, "read $pc"), "pc: 0x20000040\n");
        assert_eq!(run(&mut console, "read $r15"), "r15: 0x20000040\n");
        assert!(run(&mut console, "read $bogus").contains("unknown register"));
    }

    #[test]
    fn step_prints_new_pc() {
        let mut console = console();
        run(&mut console, "init");
        run(&mut console, "halt");
        console
            .debug_mut()
            .swd_if()
            .bus_mut()
            .set_core_reg(0x0F, 0x2000_0040);

        assert_eq!(run(&mut console, "s"), "PC: 0x20000042\n");
    }

    #[test]
    fn load_programs_the_target() {
        let mut console = console();
        run(&mut console, "init");

        let out = run(&mut console, "load simple");
        assert!(out.contains("Verification success"), "{out}");

        let sim = console.debug_mut().swd_if().bus_mut();
        assert_eq!(sim.peek(images::RAM_BASE), 0x2000_4000);
        assert_eq!(sim.peek(images::RAM_BASE + 4), 0x2000_0041);
        assert!(sim.halted());
    }

    #[test]
    fn load_unknown_name_falls_back_to_simple() {
        let mut console = console();
        run(&mut console, "init");
        let out = run(&mut console, "load whatever");
        assert!(out.contains("Loading simple"));
        assert!(out.contains("Verification success"));
    }

    #[test]
    fn reset_command() {
        let mut console = console();
        run(&mut console, "init");
        assert!(run(&mut console, "reset").contains("Successfully reset core"));
        assert!(console.debug_mut().swd_if().bus_mut().was_reset());
    }
}
