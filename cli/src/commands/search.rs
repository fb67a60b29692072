use clap::Args;
use serde_json::json;

use lostfound_core::items::Item;
use lostfound_core::search::SearchAssistResponse;

use crate::util::{api_request, exit_error, pretty};

#[derive(Args)]
pub struct SearchArgs {
    /// What you lost or found, e.g. lost my blue wallet near the library
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// Maximum number of results (1-25)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Print the raw JSON response
    #[arg(long)]
    pub json: bool,
}

pub async fn run(api_url: &str, args: SearchArgs) -> i32 {
    let query = args.text.join(" ");
    if query.trim().is_empty() {
        exit_error("query text must not be empty", None);
    }

    let mut body = json!({ "query": query });
    if let Some(limit) = args.limit {
        body["limit"] = json!(limit);
    }

    let request = api_request(api_url, reqwest::Method::POST, "/api/ai/search", Some(body));
    let response = match request.await {
        Ok(response) => response,
        Err(code) => return code,
    };

    if args.json || response.exit_code() != 0 {
        let rendered = pretty(&response.body);
        if response.exit_code() == 0 {
            println!("{rendered}");
        } else {
            eprintln!("{rendered}");
        }
        return response.exit_code();
    }

    match serde_json::from_value::<SearchAssistResponse>(response.body) {
        Ok(result) => {
            print!("{}", render(&result));
            if result.debug.fallback {
                eprintln!(
                    "note: answered without the language model ({})",
                    result.debug.errors.join("; ")
                );
            }
            0
        }
        Err(e) => exit_error(
            &format!("Unexpected search response: {e}"),
            Some("Re-run with --json to see the raw body."),
        ),
    }
}

fn render(result: &SearchAssistResponse) -> String {
    let mut out = format!("{}\n", result.message);
    for item in &result.results {
        out.push_str(&format!("  - {}\n", item_line(item)));
    }
    out
}

fn item_line(item: &Item) -> String {
    let mut line = format!("[{}] {}", item.status, item.title);
    if let Some(location) = &item.location {
        line.push_str(&format!(" · {location}"));
    }
    if let Some(date) = item.event_date {
        line.push_str(&format!(" · {date}"));
    }
    line
}
