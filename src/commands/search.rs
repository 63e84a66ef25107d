//! Search commands (KEYS, RANDOMKEY)

use super::{extract_bytes, Command, CommandContext};
use crate::error::Result;
use crate::protocol::{Arg, Reply};
use bytes::Bytes;

/// KEYS command - Find all keys matching a glob pattern
///
/// Syntax: KEYS [pattern]
///
/// Supported patterns:
/// - * : any sequence, including the empty one
/// - ? : exactly one byte
/// - [abc], [a-z], [^a] : byte classes, `^` negates
/// - \x : the literal byte x
///
/// The pattern defaults to `*`. Keys come back in byte order.
pub struct KeysCommand;

impl Command for KeysCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let pattern = match args.first() {
            Some(arg) => extract_bytes(arg)?,
            None => Bytes::from_static(b"*"),
        };

        let now = ctx.now();
        let mut matching: Vec<Bytes> = ctx
            .db()
            .keys(now)
            .into_iter()
            .filter(|key| glob_match(&pattern, key))
            .collect();
        matching.sort();

        Ok(Reply::bulk_array(matching))
    }

    fn name(&self) -> &'static str {
        "KEYS"
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// RANDOMKEY command - Return a random live key
///
/// Syntax: RANDOMKEY
pub struct RandomKeyCommand;

impl Command for RandomKeyCommand {
    fn execute(&self, ctx: &mut CommandContext, _args: &[Arg]) -> Result<Reply> {
        let now = ctx.now();
        let CommandContext { keyspace, rng, .. } = ctx;
        Ok(Reply::optional(keyspace.current().random_key(now, rng)))
    }

    fn name(&self) -> &'static str {
        "RANDOMKEY"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

/// Match `text` against a glob `pattern`
pub(crate) fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let mut p = 0;
    let mut t = 0;

    while p < pattern.len() {
        match pattern[p] {
            b'*' => {
                while p + 1 < pattern.len() && pattern[p + 1] == b'*' {
                    p += 1;
                }
                if p + 1 == pattern.len() {
                    return true;
                }
                return (t..=text.len()).any(|start| glob_match(&pattern[p + 1..], &text[start..]));
            }
            b'?' => {
                if t >= text.len() {
                    return false;
                }
                t += 1;
            }
            b'[' => {
                if t >= text.len() {
                    return false;
                }
                let (matched, consumed) = match_class(&pattern[p + 1..], text[t]);
                if !matched {
                    return false;
                }
                p += 1 + consumed;
                t += 1;
                continue;
            }
            b'\\' if p + 1 < pattern.len() => {
                p += 1;
                if t >= text.len() || pattern[p] != text[t] {
                    return false;
                }
                t += 1;
            }
            c => {
                if t >= text.len() || c != text[t] {
                    return false;
                }
                t += 1;
            }
        }
        p += 1;
    }

    t == text.len()
}

/// Match one byte against a class body (the bytes after `[`)
///
/// Returns whether it matched and how many pattern bytes the class used,
/// closing bracket included.
fn match_class(class: &[u8], byte: u8) -> (bool, usize) {
    let mut i = 0;
    let negate = class.first() == Some(&b'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    while i < class.len() && class[i] != b']' {
        if class[i] == b'\\' && i + 1 < class.len() {
            i += 1;
            matched |= class[i] == byte;
        } else if i + 2 < class.len() && class[i + 1] == b'-' {
            let (lo, hi) = if class[i] <= class[i + 2] {
                (class[i], class[i + 2])
            } else {
                (class[i + 2], class[i])
            };
            matched |= (lo..=hi).contains(&byte);
            i += 2;
        } else {
            matched |= class[i] == byte;
        }
        i += 1;
    }

    (matched != negate, (i + 1).min(class.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::commands::string::SetCommand;
    use crate::config::EngineConfig;
    use crate::clock::SystemClock;
    use std::sync::Arc;

    fn populated() -> CommandContext {
        let mut ctx = CommandContext::new();
        for key in ["user:1", "user:2", "session:abc", "hello", "hallo", "hxllo"] {
            SetCommand.execute(&mut ctx, &args![key, "v"]).unwrap();
        }
        ctx
    }

    fn keys(ctx: &mut CommandContext, pattern: &str) -> Vec<Bytes> {
        let reply = KeysCommand.execute(ctx, &args![pattern]).unwrap();
        reply
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_bulk().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_keys_all_sorted() {
        let mut ctx = populated();
        let all = KeysCommand.execute(&mut ctx, &[]).unwrap();
        assert_eq!(all.as_array().unwrap().len(), 6);
        assert_eq!(keys(&mut ctx, "*")[0], Bytes::from("hallo"));
    }

    #[test]
    fn test_keys_prefix() {
        let mut ctx = populated();
        assert_eq!(keys(&mut ctx, "user:*"), vec![Bytes::from("user:1"), Bytes::from("user:2")]);
    }

    #[test]
    fn test_keys_classes() {
        let mut ctx = populated();
        assert_eq!(keys(&mut ctx, "h[ae]llo"), vec![Bytes::from("hallo"), Bytes::from("hello")]);
        assert_eq!(keys(&mut ctx, "h[^e]llo"), vec![Bytes::from("hallo"), Bytes::from("hxllo")]);
        assert_eq!(keys(&mut ctx, "h?llo").len(), 3);
        assert_eq!(keys(&mut ctx, "user:[1-1]"), vec![Bytes::from("user:1")]);
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match(b"*", b""));
        assert!(glob_match(b"a*b*c", b"aXXbYYc"));
        assert!(!glob_match(b"a*b*c", b"aXXbYY"));
        assert!(glob_match(b"*suffix", b"has-suffix"));
        assert!(glob_match(b"a\\*", b"a*"));
        assert!(!glob_match(b"a\\*", b"ab"));
        assert!(glob_match(b"[!a]", b"!"));
        assert!(!glob_match(b"[!a]", b"b"));
        assert!(glob_match(b"[z-a]", b"m"));
        assert!(glob_match(b"[\\-]", b"-"));
        assert!(glob_match(b"[abc", b"b"));
        assert!(!glob_match(b"[abc", b"[abc"));
        assert!(!glob_match(b"?", b""));
        assert!(!glob_match(b"exact", b"exactly"));
    }

    #[test]
    fn test_randomkey() {
        let config = EngineConfig::default().with_seed(7);
        let mut ctx = CommandContext::with_config(&config, Arc::new(SystemClock));
        assert!(RandomKeyCommand.execute(&mut ctx, &[]).unwrap().is_nil());

        SetCommand.execute(&mut ctx, &args!["only", "v"]).unwrap();
        assert_eq!(RandomKeyCommand.execute(&mut ctx, &[]).unwrap(), Reply::bulk("only"));
    }
}
