use anyhow::Result;
use colored::Colorize;

pub fn run(message: &[String]) -> Result<()> {
    let message = message.join(" ");
    let reply = aura_ai::responder::respond_offline(&message);
    println!("{} {}", "aura>".cyan().bold(), reply);
    Ok(())
}
