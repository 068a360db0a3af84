use anyhow::{bail, Context};
use std::path::PathBuf;
use videoflow_core::types::Effect;

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Drop one or more files; only the first is used.
    Open(Vec<PathBuf>),
    Play,
    Pause,
    TogglePlay,
    /// Preview slider, in seconds.
    Seek(f64),
    /// Timeline click at `x` pixels into a lane `width` pixels wide.
    Click { x: f64, width: f64 },
    Effect(Effect),
    Export,
    Preset(usize),
    Tool(usize),
    Status { json: bool },
    Panel,
    Timeline,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  open <file> [more files...]   load a video (extra files are ignored)
  play | pause | toggle         control playback
  seek <seconds>                move the preview slider
  click <x> <width>             click the timeline video lane
  effect <fade-in|blur|sepia|bw>  toggle an effect
  export                        export the loaded video
  preset <1|2> | tool <1|2|3>   export presets and tools
  status [--json] | panel | timeline
  help | quit";

impl Command {
    pub fn parse(line: &str) -> anyhow::Result<Option<Command>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let cmd = match verb.to_lowercase().as_str() {
            "open" | "drop" => {
                if rest.is_empty() {
                    bail!("usage: open <file>");
                }
                Command::Open(rest.iter().map(PathBuf::from).collect())
            }
            "play" => Command::Play,
            "pause" => Command::Pause,
            "toggle" | "space" => Command::TogglePlay,
            "seek" | "scrub" => Command::Seek(number(&rest, 0, "seconds")?),
            "click" => Command::Click {
                x: number(&rest, 0, "x")?,
                width: number(&rest, 1, "width")?,
            },
            "effect" | "fx" => {
                if rest.is_empty() {
                    bail!("usage: effect <name>");
                }
                Command::Effect(rest.join(" ").parse()?)
            }
            "export" => Command::Export,
            "preset" => Command::Preset(index(&rest, "preset")?),
            "tool" => Command::Tool(index(&rest, "tool")?),
            "status" => Command::Status {
                json: rest.first() == Some(&"--json"),
            },
            "panel" => Command::Panel,
            "timeline" => Command::Timeline,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command: {other} (try `help`)"),
        };
        Ok(Some(cmd))
    }
}

fn number(args: &[&str], i: usize, what: &str) -> anyhow::Result<f64> {
    let raw = args.get(i).with_context(|| format!("missing {what}"))?;
    raw.parse::<f64>()
        .with_context(|| format!("{what} must be a number, got {raw}"))
}

/// 1-based on the prompt, 0-based in the result.
fn index(args: &[&str], what: &str) -> anyhow::Result<usize> {
    let raw = args.first().with_context(|| format!("missing {what} number"))?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => bail!("{what} must be 1 or more, got {raw}"),
    }
}
