use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    let msg = err.to_string().to_lowercase();

    if msg.contains("api key") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Set your API key with one of:");
        eprintln!("  {} export AURA_API_KEY=<value>", "$".dimmed());
        eprintln!("  {} aura chat --api-key <value>", "$".dimmed());
        eprintln!("  or add `api_key` under [api] in the file shown by `aura config path`.");
    }

    if msg.contains("(401)") || msg.contains("(403)") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  The endpoint rejected your API key. Check that it is valid.");
    }

    if msg.contains("transport error") || msg.contains("connection refused") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check your internet connection and the configured base URL.");
    }

    std::process::exit(1);
}
