//! Terminal UI: environment detection, spinner, prompts and output
//!
//! Interactive terminals get an animated spinner on stderr and `cliclack`
//! prompts. Pipes and CI get plain lines and a `[Y/n]` prompt read from
//! stdin.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    explanation, format_explanation, remark, risk_banner, step_error_detail, step_info, step_ok,
    step_warn,
};
pub use progress::ProgressIndicator;
pub use prompts::{parse_answer, Prompter, TerminalPrompter};
