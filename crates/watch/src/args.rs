use std::path::PathBuf;

use evoview::highlight::HighlightFilter;
use evoview::list::ListSort;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Watch { source: String },
    List { source: String },
    Show { source: String, id: String },
    Lineage { source: String, id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub command: Command,
    pub metric: Option<String>,
    pub highlight: HighlightFilter,
    pub interval_ms: Option<u32>,
    pub config: Option<PathBuf>,
    pub sort: ListSort,
    pub search: String,
    pub limit: Option<usize>,
}

pub const USAGE: &str = "\
evoview-watch: follow an evolutionary search from the terminal

Usage: evoview-watch [flags] <command> <source> [id]

Commands:
  watch <source>             Poll and print a summary whenever the population changes
  list <source>              Print the program list once
  show <source> <id>         Print one program's details
  lineage <source> <id>      Print a program's ancestor chain

<source> is a JSON file or an http:// or https:// URL.

Flags:
  --metric <name>            Active metric (default: first reported)
  --highlight <kind>         top | first | failed | unset | archive
  --interval-ms <ms>         Poll interval for `watch` (default 2000)
  --config <file.json>       Dashboard configuration
  --sort <key>               id | generation | island | score (list)
  --search <text>            Id substring filter (list)
  --limit <n>                Print at most n rows (list)";

fn flag_value<'a>(flag: &str, it: &mut impl Iterator<Item = &'a String>) -> Result<&'a String, String> {
    it.next().ok_or_else(|| format!("{flag} needs a value"))
}

pub fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut metric = None;
    let mut highlight = HighlightFilter::None;
    let mut interval_ms = None;
    let mut config = None;
    let mut sort = ListSort::default();
    let mut search = String::new();
    let mut limit = None;
    let mut positional: Vec<&String> = Vec::new();

    let mut it = raw.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--metric" => metric = Some(flag_value(arg, &mut it)?.clone()),
            "--highlight" => {
                let v = flag_value(arg, &mut it)?;
                highlight = HighlightFilter::from_value(v).ok_or_else(|| format!("unknown highlight filter: {v}"))?;
            }
            "--interval-ms" => {
                let v = flag_value(arg, &mut it)?;
                let ms = v.parse::<u32>().map_err(|_| format!("bad --interval-ms: {v}"))?;
                if ms < 100 {
                    return Err("--interval-ms must be at least 100".to_string());
                }
                interval_ms = Some(ms);
            }
            "--config" => config = Some(PathBuf::from(flag_value(arg, &mut it)?)),
            "--sort" => {
                let v = flag_value(arg, &mut it)?;
                sort = ListSort::from_value(v).ok_or_else(|| format!("unknown sort key: {v}"))?;
            }
            "--search" => search = flag_value(arg, &mut it)?.clone(),
            "--limit" => {
                let v = flag_value(arg, &mut it)?;
                limit = Some(v.parse::<usize>().map_err(|_| format!("bad --limit: {v}"))?);
            }
            "-h" | "--help" => return Err(String::new()),
            s if s.starts_with("--") => return Err(format!("unknown flag: {s}")),
            _ => positional.push(arg),
        }
    }

    let command = match positional.as_slice() {
        [cmd, source] if cmd.as_str() == "watch" => Command::Watch {
            source: source.to_string(),
        },
        [cmd, source] if cmd.as_str() == "list" => Command::List {
            source: source.to_string(),
        },
        [cmd, source, id] if cmd.as_str() == "show" => Command::Show {
            source: source.to_string(),
            id: id.to_string(),
        },
        [cmd, source, id] if cmd.as_str() == "lineage" => Command::Lineage {
            source: source.to_string(),
            id: id.to_string(),
        },
        [] => return Err(String::new()),
        [cmd, ..] => return Err(format!("bad arguments for `{cmd}`")),
    };

    Ok(Args {
        command,
        metric,
        highlight,
        interval_ms,
        config,
        sort,
        search,
        limit,
    })
}
