use clap::Args;
use serde_json::json;

use lostfound_core::fallback;
use lostfound_core::filter::{DEFAULT_RESULT_LIMIT, ItemFilter};

use crate::util::{exit_error, pretty};

#[derive(Args)]
pub struct ParseArgs {
    /// Query text, e.g. lost my blue wallet near the library
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

pub fn run(args: ParseArgs) -> i32 {
    let text = args.text.join(" ");
    if text.trim().is_empty() {
        exit_error("query text must not be empty", None);
    }

    let extracted = fallback::extract(&text);
    let filter = ItemFilter::from_intent(&extracted, DEFAULT_RESULT_LIMIT);
    println!(
        "{}",
        pretty(&json!({
            "intent": extracted,
            "filter": filter,
        }))
    );
    0
}
