use crate::args::CategoriesArgs;
use crate::commands::Out;
use crate::model::Flow;
use crate::Config;
use serde::{Deserialize, Serialize};

/// The suggested categories for one flow.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FlowCategories {
    pub flow: Flow,
    pub categories: Vec<String>,
}

/// Shows the categories offered when adding a transaction, from the config file or the built-in
/// lists.
pub fn categories(config: &Config, args: &CategoriesArgs) -> Out<Vec<FlowCategories>> {
    let flows = match args.flow {
        Some(flow) => vec![flow],
        None => vec![Flow::Expense, Flow::Income],
    };
    let lists: Vec<FlowCategories> = flows
        .into_iter()
        .map(|flow| FlowCategories {
            flow,
            categories: config.suggested_categories(flow),
        })
        .collect();
    let message = lists
        .iter()
        .map(|list| format!("{}: {}", list.flow, list.categories.join(", ")))
        .collect::<Vec<_>>()
        .join("\n");
    Out::new(message, lists)
}
