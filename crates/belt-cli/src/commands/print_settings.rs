use anyhow::Result;
use belt_types::TPU_PRINT_SETTINGS;

pub fn run(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&TPU_PRINT_SETTINGS)?);
        return Ok(());
    }

    println!("Recommended Print Settings ({})", TPU_PRINT_SETTINGS.material);
    let rows = TPU_PRINT_SETTINGS.rows();
    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    for (label, value) in rows {
        println!("  {:<width$}  {}", label, value, width = label_width);
    }
    Ok(())
}
