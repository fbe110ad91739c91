//! 映射規則使用的路徑表達式。
//!
//! 支援的語法刻意維持最小：
//!
//! - `key`：取物件成員
//! - `[n]`：取陣列第 n 個元素，負數從尾端算起
//! - `[*]`：展開陣列所有元素
//! - 開頭的 `$`：從文件根節點開始（否則欄位路徑相對於目前的資料列）
//!
//! 例如 `entries[*].name`、`$.scenario_id`、`data[-1]`。

use crate::utils::error::MappingError;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Root,
    Current,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Key(String),
    Index(i64),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    raw: String,
    anchor: Anchor,
    steps: Vec<Step>,
}

/// 解析時的前一個語法單元，用來判斷下一個字元是否合法
#[derive(Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Root,
    Key,
    Bracket,
    Dot,
}

impl PathExpr {
    pub fn parse(expr: &str) -> Result<Self, MappingError> {
        let malformed = |reason: &str| MappingError::MalformedPath {
            path: expr.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(malformed("path is empty"));
        }

        let (anchor, body, mut prev) = match trimmed.strip_prefix('$') {
            Some(rest) => (Anchor::Root, rest, Prev::Root),
            None => (Anchor::Current, trimmed, Prev::Start),
        };

        let chars: Vec<char> = body.chars().collect();
        let mut steps = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '[' => {
                    if !matches!(prev, Prev::Start | Prev::Root | Prev::Key | Prev::Bracket) {
                        return Err(malformed("'[' must follow a key, ']' or the start of the path"));
                    }
                    let close = chars[i + 1..]
                        .iter()
                        .position(|c| *c == ']')
                        .map(|offset| i + 1 + offset)
                        .ok_or_else(|| malformed("unterminated '['"))?;
                    let inner: String = chars[i + 1..close].iter().collect();
                    let inner = inner.trim();
                    let step = if inner == "*" {
                        Step::Wildcard
                    } else {
                        inner
                            .parse::<i64>()
                            .map(Step::Index)
                            .map_err(|_| malformed("array selector must be '*' or an integer"))?
                    };
                    steps.push(step);
                    prev = Prev::Bracket;
                    i = close + 1;
                }
                ']' => return Err(malformed("unmatched ']'")),
                '.' => {
                    if !matches!(prev, Prev::Root | Prev::Key | Prev::Bracket) {
                        return Err(malformed("empty key"));
                    }
                    prev = Prev::Dot;
                    i += 1;
                }
                _ => {
                    if !matches!(prev, Prev::Start | Prev::Dot) {
                        return Err(malformed("a key must follow '.' or start the path"));
                    }
                    let start = i;
                    while i < chars.len() && !matches!(chars[i], '.' | '[' | ']') {
                        i += 1;
                    }
                    let key: String = chars[start..i].iter().collect();
                    steps.push(Step::Key(key));
                    prev = Prev::Key;
                }
            }
        }

        if prev == Prev::Dot {
            return Err(malformed("path ends with '.'"));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            anchor,
            steps,
        })
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn has_wildcard(&self) -> bool {
        self.steps.iter().any(|s| *s == Step::Wildcard)
    }

    /// 依序套用每個步驟；找不到的路徑只會得到空結果，不會報錯
    pub fn select<'a>(&self, root: &'a Value, current: &'a Value) -> Vec<&'a Value> {
        let start = match self.anchor {
            Anchor::Root => root,
            Anchor::Current => current,
        };

        let mut frontier = vec![start];
        for step in &self.steps {
            let mut next = Vec::with_capacity(frontier.len());
            for value in frontier {
                match step {
                    Step::Key(key) => {
                        if let Some(child) = value.as_object().and_then(|obj| obj.get(key)) {
                            next.push(child);
                        }
                    }
                    Step::Index(index) => {
                        if let Some(child) = value.as_array().and_then(|arr| resolve_index(arr, *index)) {
                            next.push(child);
                        }
                    }
                    Step::Wildcard => {
                        if let Some(arr) = value.as_array() {
                            next.extend(arr.iter());
                        }
                    }
                }
            }
            if next.is_empty() {
                return next;
            }
            frontier = next;
        }

        frontier
    }
}

fn resolve_index(arr: &[Value], index: i64) -> Option<&Value> {
    let len = arr.len() as i64;
    let position = if index < 0 { len + index } else { index };
    if position < 0 {
        return None;
    }
    arr.get(position as usize)
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
