//! Loop detection over consecutive identical tool calls.
//!
//! The third consecutive identical `(tool_name, normalized_args)` call is not
//! executed; a loop-warning tool result is injected instead. A fourth
//! identical call is forbidden: the worker surfaces a failure.

use serde_json::Value;

/// Verdict for one observed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopVerdict {
    /// Execute normally.
    Proceed,
    /// Third identical call: inject a warning result, do not execute.
    InjectWarning,
    /// Fourth identical call: the worker must stop and report failure.
    Forbidden,
}

/// Tracks consecutive identical tool calls within one worker step.
#[derive(Debug, Default)]
pub struct LoopDetector {
    last_key: Option<String>,
    count: u32,
}

/// Serializes a JSON value with object keys sorted recursively, so argument
/// order differences do not defeat detection.
fn normalize_args(args: &Value) -> String {
    match args {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let inner: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", k, normalize_args(&map[k])))
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(normalize_args).collect();
            format!("[{}]", inner.join(","))
        }
        other => other.to_string(),
    }
}

impl LoopDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes a call and returns what to do with it.
    pub fn observe(&mut self, tool_name: &str, args: &Value) -> LoopVerdict {
        let key = format!("{}|{}", tool_name, normalize_args(args));
        if self.last_key.as_deref() == Some(key.as_str()) {
            self.count += 1;
        } else {
            self.last_key = Some(key);
            self.count = 1;
        }
        match self.count {
            1 | 2 => LoopVerdict::Proceed,
            3 => LoopVerdict::InjectWarning,
            _ => LoopVerdict::Forbidden,
        }
    }

    /// The warning text injected in place of the third identical call.
    pub fn warning_text(tool_name: &str) -> String {
        format!(
            "Loop detected: this is the third identical call to {tool_name} with the same \
             arguments. The call was not executed. Change your approach; a fourth identical \
             call will fail this task."
        )
    }
}
