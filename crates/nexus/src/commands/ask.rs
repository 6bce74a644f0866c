//! Ask command - one-shot query from the terminal.

use anyhow::Result;
use clap::Args;
use console::Style;
use futures::StreamExt;

use nexus_agent::{AnswerFormat, ArtifactStatus, QueryEvent};

use super::{Context, bootstrap};

/// Arguments for the ask command.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question or search request to run
    #[arg(required = true)]
    pub query: String,
}

/// Run the ask command.
pub async fn run(args: AskArgs, ctx: &Context) -> Result<()> {
    let settings = bootstrap::load_settings(ctx)?;
    let agent = bootstrap::build_agent(&settings, ctx.verbose)?;

    let dim = Style::new().dim();
    let red = Style::new().red();

    let mut stream = agent.run_query(args.query);

    while let Some(event) = stream.next().await {
        // Raw NDJSON for scripting
        if ctx.json_output {
            println!("{}", serde_json::to_string(&event)?);
            continue;
        }

        match event {
            QueryEvent::Status { message } => {
                println!("{}", dim.apply_to(&message));
            }
            QueryEvent::ToolArtifact {
                tool_name,
                status,
                result,
                ..
            } => {
                let label = match status {
                    ArtifactStatus::Success => "done",
                    ArtifactStatus::Fail => "failed",
                };
                println!("{}", dim.apply_to(format!("[{}: {}]", tool_name, label)));
                if ctx.verbose {
                    println!("{}", dim.apply_to(&result));
                }
            }
            QueryEvent::Answer { content, format } => match format {
                AnswerFormat::Json => println!("{}", render_json_answer(&content)),
                AnswerFormat::Text => println!("{}", content),
            },
            QueryEvent::Error { message } => {
                eprintln!("{} {}", red.apply_to("Error:"), message);
                return Err(anyhow::anyhow!(message));
            }
        }
    }

    Ok(())
}

/// Strip Markdown code fences and pretty-print the payload, falling back to
/// the raw text when it does not parse.
fn render_json_answer(content: &str) -> String {
    let cleaned = content.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    match serde_json::from_str::<serde_json::Value>(cleaned) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| cleaned.to_string()),
        Err(_) => cleaned.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_payloads_are_cleaned_and_pretty_printed() {
        let rendered = render_json_answer("```json\n[{\"name\": \"Elena Silva\"}]\n```");
        assert!(rendered.contains("\"name\": \"Elena Silva\""));
        assert!(!rendered.contains("```"));
    }

    #[test]
    fn non_json_answers_pass_through() {
        assert_eq!(render_json_answer("no leads found"), "no leads found");
    }
}
