use breakquest_core::storage::Database;
use breakquest_core::CoreError;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum InventoryAction {
    /// List awarded loot in award order
    List,
    /// Print the number of awarded items
    Count,
}

pub fn run(action: InventoryAction) -> Result<(), CoreError> {
    let db = Database::open()?;
    let items = db.inventory()?;

    match action {
        InventoryAction::List => {
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        InventoryAction::Count => {
            println!("{}", items.len());
        }
    }
    Ok(())
}
