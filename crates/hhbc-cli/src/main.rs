use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use hhbc::bytecode::{
    InstrIter, Op, StackSpec, instr_num_pops, instr_num_pushes, instr_succ_offsets,
    instr_to_string,
};
use hhbc::{Unit, UnitLookup};

#[derive(Parser)]
#[command(name = "hhbc")]
#[command(about = "Disassemble and analyze bytecode instruction streams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every instruction with its stack effect and successors
    Disasm {
        #[arg(help = "Input bytecode file")]
        input: PathBuf,

        #[arg(long, help = "Input is hex text rather than raw bytes")]
        hex: bool,

        #[arg(long, help = "Emit one JSON object per instruction")]
        json: bool,

        #[arg(
            short,
            long,
            help = "Literal string table, one string per line, ids counting from 0"
        )]
        strings: Option<PathBuf>,
    },
    /// Print the opcode table
    Opcodes {
        #[arg(long, help = "Emit JSON")]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Disasm {
            input,
            hex,
            json,
            strings,
        } => {
            let mut unit = Unit::new();
            if let Some(path) = strings {
                for s in read_litstrs(&path)? {
                    unit.merge_litstr(&s);
                }
            }
            unit.set_bytecode(read_bytecode(&input, hex)?);
            disasm(&unit, json)?;
        }
        Commands::Opcodes { json } => print_opcodes(json),
    }

    Ok(())
}

fn disasm(unit: &Unit, json: bool) -> Result<()> {
    let bytes = unit.bytecode();
    let mut count = 0usize;
    for decoded in InstrIter::new(bytes) {
        let (pc, op) = decoded.with_context(|| "Malformed instruction stream")?;
        let text = instr_to_string(bytes, pc, Some(unit))
            .with_context(|| format!("Failed to render {op} at {pc}"))?;
        let pops = instr_num_pops(bytes, pc)?;
        let pushes = instr_num_pushes(bytes, pc)?;
        let succs: Vec<usize> = instr_succ_offsets(bytes, pc)?.into_iter().collect();
        if json {
            println!(
                "{}",
                json!({
                    "offset": pc,
                    "op": op.name(),
                    "text": text,
                    "pops": pops,
                    "pushes": pushes,
                    "succs": succs,
                })
            );
        } else {
            let succs: Vec<String> = succs.iter().map(ToString::to_string).collect();
            println!(
                "{pc:>6}: {text:<48} ; -{pops} +{pushes} -> [{}]",
                succs.join(", ")
            );
        }
        count += 1;
    }
    tracing::debug!(count, len = bytes.len(), "disassembled stream");
    Ok(())
}

fn stack_spec(spec: StackSpec) -> String {
    match spec {
        StackSpec::Fixed(flavors) => flavors
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(" "),
        StackSpec::InsertMid(depth, flavor) => format!("{}@{depth}", flavor.name()),
        other => format!("{other:?}"),
    }
}

fn print_opcodes(json: bool) {
    for op in Op::valid() {
        let info = op.info();
        let imms: Vec<String> = info.imms.iter().map(|ty| format!("{ty:?}")).collect();
        let inputs = stack_spec(info.inputs);
        let outputs = stack_spec(info.outputs);
        if json {
            println!(
                "{}",
                json!({
                    "opcode": op as u8,
                    "name": info.name,
                    "imms": imms,
                    "inputs": inputs,
                    "outputs": outputs,
                    "control_flow": op.is_control_flow(),
                    "terminal": op.is_terminal(),
                    "reads_fpi": op.reads_current_fpi(),
                })
            );
        } else {
            println!(
                "{:>3} {:<16} [{}] ({}) -> ({})",
                op as u8,
                info.name,
                imms.join(", "),
                inputs,
                outputs
            );
        }
    }
}

fn read_bytecode(path: &Path, hex: bool) -> Result<Vec<u8>> {
    if !hex {
        return fs::read(path).with_context(|| format!("Failed to read {}", path.display()));
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_hex(&text).with_context(|| format!("{}: invalid hex input", path.display()))
}

/// Parse hex text. Whitespace is ignored and `#` starts a comment.
fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let digits: String = text
        .lines()
        .map(|line| line.split_once('#').map_or(line, |(code, _)| code))
        .flat_map(str::chars)
        .filter(|c| !c.is_whitespace())
        .collect();
    if !digits.is_ascii() {
        anyhow::bail!("non-hex characters in input");
    }
    if digits.len() % 2 != 0 {
        anyhow::bail!("odd number of hex digits");
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .with_context(|| format!("bad hex byte '{}'", &digits[i..i + 2]))
        })
        .collect()
}

fn read_litstrs(path: &Path) -> Result<Vec<String>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(contents.lines().map(str::to_owned).collect())
}
