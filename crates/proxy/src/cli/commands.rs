use gb_protocol::COMMANDS;

/// Print the command catalogue, grouped by category.
pub fn list(json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(COMMANDS)?);
        return Ok(());
    }

    let width = COMMANDS.iter().map(|c| c.name.len()).max().unwrap_or(0);
    let mut current = None;
    for cmd in COMMANDS {
        if current != Some(cmd.category) {
            let label = serde_json::to_value(cmd.category)?;
            println!("\n[{}]", label.as_str().unwrap_or_default());
            current = Some(cmd.category);
        }
        let params = if cmd.params.is_empty() {
            String::new()
        } else {
            format!(" ({})", cmd.params.join(", "))
        };
        println!("  {:<width$}  {}{}", cmd.name, cmd.description, params);
    }
    Ok(())
}
