//! Command script parsing.
//!
//! One command per line; blank lines and `#` comments are skipped. Parsing
//! is pure: the caller turns commands into dispatched actions.

use anyhow::{Context, Result, anyhow, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOption {
    CaseSensitive,
    WholeWord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    Find(String),
    Replace { pattern: String, replacement: String },
    ReplaceAll { pattern: String, replacement: String },
    Undo,
    Redo,
    Insert { pos: usize, text: String },
    Delete { start: usize, end: usize },
    Select { start: usize, end: usize },
    Set { option: ScriptOption, on: bool },
}

pub fn parse_script(src: &str) -> Result<Vec<ScriptCommand>> {
    let mut out = Vec::new();
    for (idx, line) in src.lines().enumerate() {
        if let Some(cmd) = parse_line(line).with_context(|| format!("script line {}", idx + 1))? {
            out.push(cmd);
        }
    }
    Ok(out)
}

pub fn parse_line(line: &str) -> Result<Option<ScriptCommand>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let words = split_args(trimmed)?;
    let Some((name, rest)) = words.split_first() else {
        return Ok(None);
    };
    let cmd = match (name.as_str(), rest) {
        ("find", [pattern]) => ScriptCommand::Find(pattern.clone()),
        ("replace", [pattern, replacement]) => ScriptCommand::Replace {
            pattern: pattern.clone(),
            replacement: replacement.clone(),
        },
        ("replace-all", [pattern, replacement]) => ScriptCommand::ReplaceAll {
            pattern: pattern.clone(),
            replacement: replacement.clone(),
        },
        ("undo", []) => ScriptCommand::Undo,
        ("redo", []) => ScriptCommand::Redo,
        ("insert", [pos, text]) => ScriptCommand::Insert {
            pos: number(pos)?,
            text: text.clone(),
        },
        ("delete", [start, end]) => ScriptCommand::Delete {
            start: number(start)?,
            end: number(end)?,
        },
        ("select", [start, end]) => ScriptCommand::Select {
            start: number(start)?,
            end: number(end)?,
        },
        ("set", [option, value]) => ScriptCommand::Set {
            option: match option.as_str() {
                "case-sensitive" => ScriptOption::CaseSensitive,
                "whole-word" => ScriptOption::WholeWord,
                other => bail!("unknown option `{other}`"),
            },
            on: match value.as_str() {
                "on" => true,
                "off" => false,
                other => bail!("expected on/off, got `{other}`"),
            },
        },
        (
            "find" | "replace" | "replace-all" | "undo" | "redo" | "insert" | "delete" | "select"
            | "set",
            _,
        ) => bail!("wrong number of arguments for `{name}`"),
        (other, _) => bail!("unknown command `{other}`"),
    };
    Ok(Some(cmd))
}

fn number(word: &str) -> Result<usize> {
    word.parse()
        .map_err(|_| anyhow!("expected a char offset, got `{word}`"))
}

/// Whitespace-separated words; double quotes group and accept `\"`, `\\`,
/// `\n` and `\t` escapes.
fn split_args(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            return Ok(words);
        };
        let mut word = String::new();
        if first == '"' {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some('n') => word.push('\n'),
                        Some('t') => word.push('\t'),
                        Some(c @ ('"' | '\\')) => word.push(c),
                        Some(c) => bail!("unknown escape `\\{c}`"),
                        None => bail!("unterminated quote"),
                    },
                    Some(c) => word.push(c),
                    None => bail!("unterminated quote"),
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                word.push(c);
            }
        }
        words.push(word);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_find_and_undo() {
        assert_eq!(
            parse_line("find world").unwrap(),
            Some(ScriptCommand::Find("world".into()))
        );
        assert_eq!(parse_line("  undo ").unwrap(), Some(ScriptCommand::Undo));
        assert_eq!(parse_line("redo").unwrap(), Some(ScriptCommand::Redo));
    }

    #[test]
    fn quoted_arguments_keep_spaces_and_escapes() {
        assert_eq!(
            parse_line(r#"replace-all "a b" "say \"hi\"\n""#).unwrap(),
            Some(ScriptCommand::ReplaceAll {
                pattern: "a b".into(),
                replacement: "say \"hi\"\n".into(),
            })
        );
        assert_eq!(
            parse_line(r#"replace x """#).unwrap(),
            Some(ScriptCommand::Replace {
                pattern: "x".into(),
                replacement: String::new(),
            })
        );
    }

    #[test]
    fn positional_commands() {
        assert_eq!(
            parse_line("insert 3 abc").unwrap(),
            Some(ScriptCommand::Insert {
                pos: 3,
                text: "abc".into()
            })
        );
        assert_eq!(
            parse_line("delete 1 4").unwrap(),
            Some(ScriptCommand::Delete { start: 1, end: 4 })
        );
        assert_eq!(
            parse_line("set whole-word on").unwrap(),
            Some(ScriptCommand::Set {
                option: ScriptOption::WholeWord,
                on: true
            })
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let cmds = parse_script("# header\n\nfind a\n   # indented\nundo\n").unwrap();
        assert_eq!(cmds, vec![ScriptCommand::Find("a".into()), ScriptCommand::Undo]);
    }

    #[test]
    fn errors_name_the_line() {
        let err = parse_script("find a\nfrobnicate\n").unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("script line 2"), "{msg}");
        assert!(msg.contains("frobnicate"), "{msg}");
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert!(parse_line("find").is_err());
        assert!(parse_line("insert x abc").is_err());
        assert!(parse_line("find \"open").is_err());
        assert!(parse_line("set colour on").is_err());
        assert!(parse_line("set whole-word maybe").is_err());
    }
}
