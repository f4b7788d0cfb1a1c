//! Line-delimited JSON spoken with the Node.js bridge
//!
//! Every command carries an id; the bridge answers each with exactly one
//! reply bearing the same id. Request events are pushed unsolicited.

use serde::{Deserialize, Serialize};
use webinstall_core::Locator;

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op<'a> {
    Visit { path: &'a str },
    Exists { locator: &'a Locator },
    Count { locator: &'a Locator },
    Visible { locator: &'a Locator },
    Click { locator: &'a Locator, force: bool },
    Type { locator: &'a Locator, text: &'a str },
    Select { locator: &'a Locator, value: &'a str },
    Clear { locator: &'a Locator },
    Scroll { locator: &'a Locator },
    Text { locator: &'a Locator },
    Close,
}

impl Op<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Visit { .. } => "visit",
            Op::Exists { .. } => "exists",
            Op::Count { .. } => "count",
            Op::Visible { .. } => "visible",
            Op::Click { .. } => "click",
            Op::Type { .. } => "type",
            Op::Select { .. } => "select",
            Op::Clear { .. } => "clear",
            Op::Scroll { .. } => "scroll",
            Op::Text { .. } => "text",
            Op::Close => "close",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Command<'a> {
    pub id: u64,
    #[serde(flatten)]
    pub op: Op<'a>,
}

impl Command<'_> {
    /// Encode as a single protocol line, newline included.
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reply {
    pub id: u64,
    pub ok: bool,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Browser launched and page open
    Ready,
    Reply(Reply),
    /// A request made by the page completed
    Request { url: String, method: String },
}
