use rememberly_core::models::category_counts;
use serde::Serialize;

use crate::commands::common::open_workspace;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct CategoryItem {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    count: usize,
}

pub async fn run_categories(as_json: bool, profile: Option<&str>) -> Result<(), CliError> {
    let workspace = open_workspace(profile)?;
    workspace.require_session().await?;

    let notes = workspace.context.notes().fetch_notes().await?;
    let counts = category_counts(&notes);

    if as_json {
        let items = counts
            .iter()
            .map(|(category, count)| CategoryItem {
                id: category.id,
                name: category.name,
                description: category.description,
                count: *count,
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for (category, count) in counts {
            println!("{:<12}  {count:>4}  {}", category.name, category.description);
        }
    }
    Ok(())
}
